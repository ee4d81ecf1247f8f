//! Rounding-aware sqrt-price amount formulas.
//!
//! For liquidity `L` between sqrt prices `a < b`:
//!
//! * `amount0 = L * (b - a) / (a * b)` (token0 sits above the current price)
//! * `amount1 = L * (b - a)` (token1 sits below it)
//!
//! The next-price functions move the price by a token amount. Rounding
//! directions follow the invariant that real reserves can never go negative:
//! inputs round the price toward the trade, outputs round it away.

use crate::decimal::{Rounding, UDecimal};
use crate::error::MathError;

fn ordered<'a>(
    sqrt_a: &'a UDecimal,
    sqrt_b: &'a UDecimal,
) -> Result<(&'a UDecimal, &'a UDecimal), MathError> {
    let (lower, upper) = if sqrt_a <= sqrt_b {
        (sqrt_a, sqrt_b)
    } else {
        (sqrt_b, sqrt_a)
    };
    if lower.is_zero() {
        return Err(MathError::InvalidPriceRange);
    }
    Ok((lower, upper))
}

/// Amount of token0 spanned by `liquidity` between the two sqrt prices.
pub fn get_amount0_delta(
    sqrt_a: &UDecimal,
    sqrt_b: &UDecimal,
    liquidity: &UDecimal,
    round_up: bool,
) -> Result<UDecimal, MathError> {
    let (lower, upper) = ordered(sqrt_a, sqrt_b)?;
    if lower == upper {
        return Ok(UDecimal::zero());
    }
    let numerator = liquidity.mul(&upper.sub(lower)?);
    let amount = numerator
        .div(upper, Rounding::HalfUp)?
        .div(lower, Rounding::HalfUp)?;
    let direction = if round_up { Rounding::Ceil } else { Rounding::Floor };
    Ok(amount.round(crate::decimal::DECIMAL_PLACES, direction))
}

/// Amount of token1 spanned by `liquidity` between the two sqrt prices.
pub fn get_amount1_delta(
    sqrt_a: &UDecimal,
    sqrt_b: &UDecimal,
    liquidity: &UDecimal,
    round_up: bool,
) -> Result<UDecimal, MathError> {
    let (lower, upper) = ordered(sqrt_a, sqrt_b)?;
    if lower == upper {
        return Ok(UDecimal::zero());
    }
    let amount = liquidity.mul(&upper.sub(lower)?);
    let direction = if round_up { Rounding::Ceil } else { Rounding::Floor };
    Ok(amount.round(crate::decimal::DECIMAL_PLACES, direction))
}

/// Price after consuming `amount_in` of the input token.
///
/// `zero_for_one` sells token0, so the price falls; otherwise it rises. The
/// result is rounded so the pool never owes more than it holds.
pub fn get_next_sqrt_price_from_input(
    sqrt_price: &UDecimal,
    liquidity: &UDecimal,
    amount_in: &UDecimal,
    zero_for_one: bool,
) -> Result<UDecimal, MathError> {
    if liquidity.is_zero() {
        return Err(MathError::InsufficientLiquidity);
    }
    if amount_in.is_zero() {
        return Ok(sqrt_price.clone());
    }

    if zero_for_one {
        // L * s / (L + in * s), rounded up.
        let numerator = liquidity.mul(sqrt_price);
        let denominator = liquidity.add(&amount_in.mul(sqrt_price));
        numerator.div(&denominator, Rounding::Ceil)
    } else {
        // s + in / L, the division rounded down.
        Ok(sqrt_price.add(&amount_in.div(liquidity, Rounding::Floor)?))
    }
}

/// Price after producing `amount_out` of the output token.
///
/// Fails with [`MathError::InsufficientLiquidity`] when the requested output
/// exceeds what `liquidity` can provide on this side of the price.
pub fn get_next_sqrt_price_from_output(
    sqrt_price: &UDecimal,
    liquidity: &UDecimal,
    amount_out: &UDecimal,
    zero_for_one: bool,
) -> Result<UDecimal, MathError> {
    if liquidity.is_zero() {
        return Err(MathError::InsufficientLiquidity);
    }
    if amount_out.is_zero() {
        return Ok(sqrt_price.clone());
    }

    if zero_for_one {
        // Output is token1: s - out / L, the division rounded up.
        let step = amount_out.div(liquidity, Rounding::Ceil)?;
        let next = sqrt_price
            .sub(&step)
            .map_err(|_| MathError::InsufficientLiquidity)?;
        if next.is_zero() {
            return Err(MathError::InsufficientLiquidity);
        }
        Ok(next)
    } else {
        // Output is token0: L * s / (L - out * s), rounded up.
        let product = amount_out.mul(sqrt_price);
        let denominator = liquidity
            .sub(&product)
            .map_err(|_| MathError::InsufficientLiquidity)?;
        if denominator.is_zero() {
            return Err(MathError::InsufficientLiquidity);
        }
        liquidity.mul(sqrt_price).div(&denominator, Rounding::Ceil)
    }
}
