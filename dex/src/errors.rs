//! Error taxonomy for the pool engine.
//!
//! Every failure aborts the current transaction; the host sees a structured
//! kind plus a human-readable reason and never observes partial writes.
//! Retries are the host's business, keyed by the DTO `unique_key`.

use amm_math::MathError;
use thiserror::Error;

/// Engine-level failure kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DexError {
    /// Malformed DTO: tick off the spacing grid, inverted range, negative
    /// amount where a positive one is required, unsupported fee tier, a
    /// sqrt-price limit on the wrong side, an expiry in the past.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A pool, position, tick or commitment that should exist does not.
    #[error("not found: {0}")]
    NotFound(String),

    /// State would become inconsistent: unsigned underflow, burning more
    /// liquidity than held, an already-existing pool, impossible rounding.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller is not in the relevant admin, authority or whitelist set.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A swap violated `amount_in_maximum` / `amount_out_minimum`, or the
    /// price limit stopped an exact-in swap short of its minimum output.
    #[error("slippage: {0}")]
    Slippage(String),

    /// An operation's precondition does not hold, e.g. sweeping unclaimed
    /// funds while open positions remain.
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl From<MathError> for DexError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InvalidDecimal(_)
            | MathError::TickOutOfBounds(_)
            | MathError::InvalidPriceRange => DexError::ValidationFailed(err.to_string()),
            MathError::UintOutOfBounds(_)
            | MathError::DivisionByZero(_)
            | MathError::InsufficientLiquidity => DexError::Conflict(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for DexError {
    fn from(err: serde_json::Error) -> Self {
        DexError::Conflict(format!("serialization: {err}"))
    }
}

pub type DexResult<T> = Result<T, DexError>;
