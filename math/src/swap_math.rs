//! Single-step swap computation: how far the price moves, and what flows in
//! and out, within one tick range.
//!
//! The step never looks at ticks; the caller bounds `sqrt_price_target` by
//! the next initialized tick and the swap's price limit, and assigns signs.

use crate::decimal::{Rounding, SDecimal, UDecimal};
use crate::error::MathError;
use crate::sqrt_price_math::{
    get_amount0_delta, get_amount1_delta, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};

/// Fee rates are expressed in hundredths of a basis point out of this.
pub const FEE_PIPS_DENOMINATOR: u32 = 1_000_000;

/// Result of one swap step. All quantities are unsigned; direction is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapStep {
    /// Price after the step.
    pub sqrt_price_next: UDecimal,
    /// Input-token amount consumed, fee excluded.
    pub amount_in: UDecimal,
    /// Output-token amount produced.
    pub amount_out: UDecimal,
    /// Fee charged on top of `amount_in`.
    pub fee_amount: UDecimal,
}

/// Computes one step between `sqrt_price_current` and `sqrt_price_target`.
///
/// `amount_remaining >= 0` means exact-input (the fee is carved out of it);
/// negative means exact-output. With zero liquidity the price jumps straight
/// to the target and nothing flows.
pub fn compute_swap_step(
    sqrt_price_current: &UDecimal,
    sqrt_price_target: &UDecimal,
    liquidity: &UDecimal,
    amount_remaining: &SDecimal,
    fee_pips: u32,
) -> Result<SwapStep, MathError> {
    if liquidity.is_zero() {
        return Ok(SwapStep {
            sqrt_price_next: sqrt_price_target.clone(),
            amount_in: UDecimal::zero(),
            amount_out: UDecimal::zero(),
            fee_amount: UDecimal::zero(),
        });
    }

    let zero_for_one = sqrt_price_current >= sqrt_price_target;
    let exact_in = !amount_remaining.is_negative();
    let remaining = amount_remaining.abs();

    let fee_numerator = UDecimal::from_u64(u64::from(fee_pips));
    let fee_denominator =
        UDecimal::from_u64(u64::from(FEE_PIPS_DENOMINATOR - fee_pips.min(FEE_PIPS_DENOMINATOR)));

    let mut amount_in_to_target = None;
    let mut amount_out_to_target = None;

    let sqrt_price_next = if exact_in {
        let remaining_less_fee = remaining
            .mul(&fee_denominator)
            .div(&UDecimal::from_u64(u64::from(FEE_PIPS_DENOMINATOR)), Rounding::Floor)?;
        let needed = if zero_for_one {
            get_amount0_delta(sqrt_price_target, sqrt_price_current, liquidity, true)?
        } else {
            get_amount1_delta(sqrt_price_current, sqrt_price_target, liquidity, true)?
        };
        let next = if remaining_less_fee >= needed {
            sqrt_price_target.clone()
        } else {
            get_next_sqrt_price_from_input(
                sqrt_price_current,
                liquidity,
                &remaining_less_fee,
                zero_for_one,
            )?
        };
        amount_in_to_target = Some(needed);
        next
    } else {
        let available = if zero_for_one {
            get_amount1_delta(sqrt_price_target, sqrt_price_current, liquidity, false)?
        } else {
            get_amount0_delta(sqrt_price_current, sqrt_price_target, liquidity, false)?
        };
        let next = if remaining >= available {
            sqrt_price_target.clone()
        } else {
            get_next_sqrt_price_from_output(
                sqrt_price_current,
                liquidity,
                &remaining,
                zero_for_one,
            )?
        };
        amount_out_to_target = Some(available);
        next
    };

    let reached_target = sqrt_price_next == *sqrt_price_target;

    let amount_in = match amount_in_to_target {
        Some(needed) if reached_target && exact_in => needed,
        _ => {
            if zero_for_one {
                get_amount0_delta(&sqrt_price_next, sqrt_price_current, liquidity, true)?
            } else {
                get_amount1_delta(sqrt_price_current, &sqrt_price_next, liquidity, true)?
            }
        }
    };
    let mut amount_out = match amount_out_to_target {
        Some(available) if reached_target && !exact_in => available,
        _ => {
            if zero_for_one {
                get_amount1_delta(&sqrt_price_next, sqrt_price_current, liquidity, false)?
            } else {
                get_amount0_delta(sqrt_price_current, &sqrt_price_next, liquidity, false)?
            }
        }
    };

    if !exact_in && amount_out > remaining {
        amount_out = remaining.clone();
    }

    let fee_amount = if exact_in && !reached_target {
        // The step consumed the whole remaining input; whatever is not
        // principal is fee.
        remaining.sub(&amount_in)?
    } else {
        amount_in
            .mul(&fee_numerator)
            .div(&fee_denominator, Rounding::Ceil)?
    };

    Ok(SwapStep {
        sqrt_price_next,
        amount_in,
        amount_out,
        fee_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> UDecimal {
        UDecimal::new(s).unwrap()
    }

    fn s(v: &str) -> SDecimal {
        SDecimal::new(v).unwrap()
    }

    #[test]
    fn zero_liquidity_short_circuits_to_target() {
        let step = compute_swap_step(
            &UDecimal::one(),
            &u("0.9"),
            &UDecimal::zero(),
            &s("100"),
            3000,
        )
        .unwrap();
        assert_eq!(step.sqrt_price_next, u("0.9"));
        assert!(step.amount_in.is_zero());
        assert!(step.amount_out.is_zero());
        assert!(step.fee_amount.is_zero());
    }

    #[test]
    fn exact_in_limited_by_remaining_amount() {
        // Selling 1000 of token0 into deep liquidity with a 0.3% fee: the
        // step cannot reach the target, consumes everything, and charges
        // exactly the carve-out as fee.
        let step = compute_swap_step(
            &UDecimal::one(),
            &u("0.99"),
            &u("10000000"),
            &s("1000"),
            3000,
        )
        .unwrap();
        assert_eq!(step.sqrt_price_next, u("0.99990030993909907183"));
        assert_eq!(step.amount_in, u("996.99999999999992537805"));
        assert_eq!(step.amount_out, u("996.9006090092817"));
        assert_eq!(step.fee_amount, u("3.00000000000007462195"));
        // Price stayed strictly inside (target, current).
        assert!(step.sqrt_price_next > u("0.99"));
        assert!(step.sqrt_price_next < UDecimal::one());
        // Everything adds back up to the specified amount.
        assert_eq!(step.amount_in.add(&step.fee_amount), u("1000"));
    }

    #[test]
    fn exact_in_reaching_the_target() {
        // Plenty of input: the price stops exactly at the target and the fee
        // is the ceil gross-up of the consumed amount.
        let step = compute_swap_step(
            &UDecimal::one(),
            &u("0.9995"),
            &u("10000000"),
            &s("100000"),
            3000,
        )
        .unwrap();
        assert_eq!(step.sqrt_price_next, u("0.9995"));
        assert!(step.amount_in.add(&step.fee_amount) < u("100000"));
    }

    #[test]
    fn exact_out_step() {
        let step = compute_swap_step(
            &UDecimal::one(),
            &u("0.99"),
            &u("10000000"),
            &s("-5000"),
            3000,
        )
        .unwrap();
        assert_eq!(step.sqrt_price_next, u("0.9995"));
        assert_eq!(step.amount_out, u("5000"));
        assert_eq!(step.amount_in, u("5002.50125062531265632816"));
        assert_eq!(step.fee_amount, u("15.05266173708719956769"));
    }

    #[test]
    fn exact_out_clamps_to_requested_amount() {
        let step = compute_swap_step(
            &UDecimal::one(),
            &u("0.9999"),
            &u("10000000"),
            &s("-100"),
            3000,
        )
        .unwrap();
        assert!(step.amount_out <= u("100"));
    }

    #[test]
    fn price_rises_for_one_for_zero() {
        let step = compute_swap_step(
            &UDecimal::one(),
            &u("1.01"),
            &u("10000000"),
            &s("1000"),
            3000,
        )
        .unwrap();
        assert!(step.sqrt_price_next > UDecimal::one());
        assert!(step.sqrt_price_next < u("1.01"));
    }
}
