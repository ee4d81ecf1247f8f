//! Tick index <-> sqrt-price conversion.
//!
//! Prices live on the grid `price = 1.0001^tick`; the engine stores
//! `sqrt(price)` and converts with a magic-constant product: the set bits of
//! `|tick|` select precomputed powers `sqrt(1.0001)^(2^k)`, multiplied
//! exactly and rounded to 20 decimal places at the end (inverted first for
//! negative ticks). The reverse direction is a binary search for the greatest
//! tick whose sqrt price does not exceed the input.

use once_cell::sync::Lazy;

use crate::decimal::{Rounding, UDecimal};
use crate::error::MathError;

/// Lowest tick index supported by the protocol.
pub const MIN_TICK: i32 = -887272;

/// Highest tick index supported by the protocol.
pub const MAX_TICK: i32 = 887272;

/// `sqrt(1.0001)^(2^k)` for `k = 0..=19`, 48 decimal places, truncated.
/// Index 0 is the square root itself; every later entry is an exact integer
/// power of 1.0001. MAX_TICK needs bits up to 2^19, so twenty entries cover
/// the whole range.
const SQRT_POWERS: [&str; 20] = [
    "1.000049998750062496094023416993798697215498950656",
    "1.000100000000000000000000000000000000000000000000",
    "1.000200010000000000000000000000000000000000000000",
    "1.000400060004000100000000000000000000000000000000",
    "1.000800280056007000560028000800010000000000000000",
    "1.001601200560182043688009144128711440800843681820",
    "1.003204964963598014666528690811055252514470627582",
    "1.006420201727613920156533908409419272724947107653",
    "1.012881622445451097078095631935005570944130079982",
    "1.025929181087729343658708608578965861392664949866",
    "1.052530684607338948386589370372923836363123251143",
    "1.107820842039993613899215811078813988304363578011",
    "1.227267018058200482050503815090808829881559895722",
    "1.506184333613467388107955981199151720478421143500",
    "2.268591246822644826925609859343607240171282303265",
    "5.146506245160322222537991751503863982453547263886",
    "26.486526531474198664033811812785769604982480587176",
    "701.536087702486644953017488493794435252145727093364",
    "492152.882348911033633683861778354995017201212145027429",
    "242214459604.341065650571799093539783052207785644789677143900",
];

static POWERS: Lazy<Vec<UDecimal>> = Lazy::new(|| {
    SQRT_POWERS
        .iter()
        .map(|s| UDecimal::new(s).expect("static sqrt power table is well-formed"))
        .collect()
});

/// `tick_to_sqrt_price(MIN_TICK)`; the lowest admissible sqrt price.
pub static MIN_SQRT_RATIO: Lazy<UDecimal> =
    Lazy::new(|| UDecimal::new("0.00000000000000000005").expect("static constant"));

/// `tick_to_sqrt_price(MAX_TICK)`; the highest admissible sqrt price.
pub static MAX_SQRT_RATIO: Lazy<UDecimal> = Lazy::new(|| {
    UDecimal::new("18446050711097703529.77634289539647206557").expect("static constant")
});

/// Converts a tick index to its sqrt price, `1.0001^(tick/2)`.
pub fn tick_to_sqrt_price(tick: i32) -> Result<UDecimal, MathError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(MathError::TickOutOfBounds(tick));
    }

    let mut product = UDecimal::one();
    let mut bits = tick.unsigned_abs();
    let mut k = 0usize;
    while bits > 0 {
        if bits & 1 == 1 {
            product = product.mul(&POWERS[k]);
        }
        bits >>= 1;
        k += 1;
    }

    if tick < 0 {
        UDecimal::one().div(&product, Rounding::HalfUp)
    } else {
        Ok(product.round(crate::decimal::DECIMAL_PLACES, Rounding::HalfUp))
    }
}

/// Greatest tick whose sqrt price does not exceed `sqrt_price`.
///
/// Binary search over the tick range; both bounds are inclusive. A zero or
/// negative input has no preimage and is rejected.
pub fn sqrt_price_to_tick(sqrt_price: &UDecimal) -> Result<i32, MathError> {
    if sqrt_price.is_zero() {
        return Err(MathError::InvalidPriceRange);
    }

    let mut low = MIN_TICK;
    let mut high = MAX_TICK;
    let mut ans = MIN_TICK;
    while low <= high {
        let mid = low + (high - low) / 2;
        if &tick_to_sqrt_price(mid)? <= sqrt_price {
            ans = mid;
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn u(s: &str) -> UDecimal {
        UDecimal::new(s).unwrap()
    }

    #[test]
    fn sqrt_price_at_zero_is_one() {
        assert_eq!(tick_to_sqrt_price(0).unwrap(), UDecimal::one());
    }

    #[test]
    fn known_sqrt_prices() {
        assert_eq!(tick_to_sqrt_price(1).unwrap(), u("1.00004999875006249609"));
        assert_eq!(tick_to_sqrt_price(-1).unwrap(), u("0.99995000374968752734"));
        assert_eq!(tick_to_sqrt_price(100).unwrap(), u("1.0050122696230512035"));
        assert_eq!(tick_to_sqrt_price(-100).unwrap(), u("0.99501272792925090387"));
        assert_eq!(tick_to_sqrt_price(60).unwrap(), u("1.00300435406274192565"));
        assert_eq!(tick_to_sqrt_price(-60).unwrap(), u("0.99700464504408921906"));
    }

    #[test]
    fn boundary_constants_match_the_conversion() {
        assert_eq!(tick_to_sqrt_price(MIN_TICK).unwrap(), *MIN_SQRT_RATIO);
        assert_eq!(tick_to_sqrt_price(MAX_TICK).unwrap(), *MAX_SQRT_RATIO);
    }

    #[test]
    fn out_of_range_ticks_error() {
        assert!(tick_to_sqrt_price(MIN_TICK - 1).is_err());
        assert!(tick_to_sqrt_price(MAX_TICK + 1).is_err());
    }

    #[test]
    fn inverse_of_one_is_tick_zero() {
        assert_eq!(sqrt_price_to_tick(&UDecimal::one()).unwrap(), 0);
    }

    #[test]
    fn inverse_picks_greatest_tick_at_or_below() {
        // Just above tick 100's sqrt price still maps to 100.
        let s = u("1.00501226962305120351");
        assert_eq!(sqrt_price_to_tick(&s).unwrap(), 100);
        // Just below maps to 99.
        let s = u("1.00501226962305120349");
        assert_eq!(sqrt_price_to_tick(&s).unwrap(), 99);
    }

    #[test]
    fn zero_price_is_rejected() {
        assert!(sqrt_price_to_tick(&UDecimal::zero()).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Round-trip over the range where 20 decimal places resolve
        // neighbouring ticks.
        #[test]
        fn round_trip_is_exact(t in -700_000i32..=700_000) {
            let s = tick_to_sqrt_price(t).unwrap();
            prop_assert_eq!(sqrt_price_to_tick(&s).unwrap(), t);
        }

        #[test]
        fn conversion_is_monotone(t in MIN_TICK..MAX_TICK) {
            let a = tick_to_sqrt_price(t).unwrap();
            let b = tick_to_sqrt_price(t + 1).unwrap();
            prop_assert!(a <= b);
        }
    }
}
