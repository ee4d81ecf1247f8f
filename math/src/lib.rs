//! Math primitives for the concentrated-liquidity pool engine.
//!
//! Everything here is pure and deterministic: exact decimal big numbers with
//! explicit rounding, tick <-> sqrt-price conversion, the rounding-aware
//! sqrt-price amount formulas, 256-bit bit scanning for the tick bitmap, and
//! the single-step swap computation. No I/O, no engine types, no floats.

pub mod bit_math;
pub mod decimal;
pub mod error;
pub mod liquidity_math;
pub mod sqrt_price_math;
pub mod swap_math;
pub mod tick_math;

pub use decimal::{Rounding, SDecimal, UDecimal, DECIMAL_PLACES, TOKEN_DECIMALS};
pub use error::MathError;
pub use tick_math::{MAX_TICK, MIN_TICK};
