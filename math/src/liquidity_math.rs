//! Liquidity arithmetic: converting desired token amounts into a liquidity
//! figure for a price range, and applying signed liquidity deltas.

use crate::decimal::{Rounding, SDecimal, UDecimal};
use crate::error::MathError;

/// Liquidity obtainable from `amount0` between two sqrt prices:
/// `amount0 * a * b / (b - a)`.
pub fn get_liquidity_for_amount0(
    sqrt_a: &UDecimal,
    sqrt_b: &UDecimal,
    amount0: &UDecimal,
) -> Result<UDecimal, MathError> {
    let (lower, upper) = if sqrt_a <= sqrt_b {
        (sqrt_a, sqrt_b)
    } else {
        (sqrt_b, sqrt_a)
    };
    let width = upper.sub(lower)?;
    if width.is_zero() {
        return Err(MathError::InvalidPriceRange);
    }
    amount0.mul(lower).mul(upper).div(&width, Rounding::HalfUp)
}

/// Liquidity obtainable from `amount1` between two sqrt prices:
/// `amount1 / (b - a)`.
pub fn get_liquidity_for_amount1(
    sqrt_a: &UDecimal,
    sqrt_b: &UDecimal,
    amount1: &UDecimal,
) -> Result<UDecimal, MathError> {
    let (lower, upper) = if sqrt_a <= sqrt_b {
        (sqrt_a, sqrt_b)
    } else {
        (sqrt_b, sqrt_a)
    };
    let width = upper.sub(lower)?;
    if width.is_zero() {
        return Err(MathError::InvalidPriceRange);
    }
    amount1.div(&width, Rounding::HalfUp)
}

/// Liquidity for a pair of desired deposits, given where the current price
/// sits relative to the range: below takes token0 only, above token1 only,
/// inside the minimum of both single-token figures.
pub fn get_liquidity_for_amounts(
    sqrt_current: &UDecimal,
    sqrt_lower: &UDecimal,
    sqrt_upper: &UDecimal,
    amount0: &UDecimal,
    amount1: &UDecimal,
) -> Result<UDecimal, MathError> {
    if sqrt_lower >= sqrt_upper {
        return Err(MathError::InvalidPriceRange);
    }
    if sqrt_current <= sqrt_lower {
        get_liquidity_for_amount0(sqrt_lower, sqrt_upper, amount0)
    } else if sqrt_current < sqrt_upper {
        let l0 = get_liquidity_for_amount0(sqrt_current, sqrt_upper, amount0)?;
        let l1 = get_liquidity_for_amount1(sqrt_lower, sqrt_current, amount1)?;
        Ok(l0.min(l1))
    } else {
        get_liquidity_for_amount1(sqrt_lower, sqrt_upper, amount1)
    }
}

/// Applies a signed delta to a liquidity figure; going below zero is an
/// error, never a wrap.
pub fn add_liquidity_delta(
    liquidity: &UDecimal,
    delta: &SDecimal,
) -> Result<UDecimal, MathError> {
    liquidity.to_signed().add(delta).into_unsigned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> UDecimal {
        UDecimal::new(s).unwrap()
    }

    #[test]
    fn liquidity_round_trips_through_amounts() {
        // The amounts produced by one unit of liquidity convert back to
        // (almost exactly) one unit.
        let upper = u("1.0050122696230512035");
        let lower = u("0.99501272792925090387");
        let amt = u("0.00498727207074909613");
        let l0 = get_liquidity_for_amount0(&UDecimal::one(), &upper, &amt).unwrap();
        assert_eq!(l0, u("0.99999999999999999944"));
        let l1 = get_liquidity_for_amount1(&lower, &UDecimal::one(), &amt).unwrap();
        assert_eq!(l1, UDecimal::one());
    }

    #[test]
    fn in_range_takes_the_minimum() {
        let lower = u("0.99501272792925090387");
        let upper = u("1.0050122696230512035");
        let l = get_liquidity_for_amounts(
            &UDecimal::one(),
            &lower,
            &upper,
            &u("0.00498727207074909613"),
            &u("1000"),
        )
        .unwrap();
        // Token0 is the binding side.
        assert_eq!(l, u("0.99999999999999999944"));
    }

    #[test]
    fn out_of_range_uses_single_token() {
        let lower = u("1.00004999875006249609");
        let upper = u("1.0050122696230512035");
        // Price below the range: only token0 matters.
        let l = get_liquidity_for_amounts(
            &u("0.5"),
            &lower,
            &upper,
            &u("1"),
            &u("999999"),
        )
        .unwrap();
        assert_eq!(
            l,
            get_liquidity_for_amount0(&lower, &upper, &u("1")).unwrap()
        );
        // Price above the range: only token1 matters.
        let l = get_liquidity_for_amounts(&u("2"), &lower, &upper, &u("999999"), &u("1")).unwrap();
        assert_eq!(
            l,
            get_liquidity_for_amount1(&lower, &upper, &u("1")).unwrap()
        );
    }

    #[test]
    fn empty_range_is_rejected() {
        let s = u("1.5");
        assert!(get_liquidity_for_amount0(&s, &s, &u("1")).is_err());
        assert!(get_liquidity_for_amounts(&s, &s, &s, &u("1"), &u("1")).is_err());
    }

    #[test]
    fn signed_delta_application() {
        let l = u("10");
        let up = add_liquidity_delta(&l, &SDecimal::from_i64(5)).unwrap();
        assert_eq!(up, u("15"));
        let down = add_liquidity_delta(&l, &SDecimal::from_i64(-10)).unwrap();
        assert!(down.is_zero());
        assert!(add_liquidity_delta(&l, &SDecimal::from_i64(-11)).is_err());
    }
}
