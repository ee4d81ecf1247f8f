use amm_math::{SDecimal, UDecimal};

use crate::tick::{fee_growth_inside, TickData};

fn u(s: &str) -> UDecimal {
    UDecimal::new(s).unwrap()
}

fn s(v: &str) -> SDecimal {
    SDecimal::new(v).unwrap()
}

#[test]
fn first_liquidity_initializes_and_flips() {
    let mut tick = TickData::empty("pool", -60);
    let flipped = tick
        .update(0, &s("5"), &u("7"), &u("11"), false)
        .unwrap();
    assert!(flipped);
    assert!(tick.initialized);
    assert_eq!(tick.liquidity_gross, u("5"));
    assert_eq!(tick.liquidity_net, s("5"));
    // Tick below the current price adopts the globals as its checkpoint.
    assert_eq!(tick.fee_growth_outside0, s("7"));
    assert_eq!(tick.fee_growth_outside1, s("11"));
}

#[test]
fn tick_above_current_price_starts_with_zero_outside() {
    let mut tick = TickData::empty("pool", 60);
    tick.update(0, &s("5"), &u("7"), &u("11"), true).unwrap();
    assert_eq!(tick.fee_growth_outside0, SDecimal::zero());
    assert_eq!(tick.fee_growth_outside1, SDecimal::zero());
    // Upper boundary: crossing upward removes the liquidity.
    assert_eq!(tick.liquidity_net, s("-5"));
}

#[test]
fn adding_to_a_live_tick_does_not_flip_or_reset() {
    let mut tick = TickData::empty("pool", -60);
    tick.update(0, &s("5"), &u("7"), &u("0"), false).unwrap();
    let flipped = tick.update(0, &s("3"), &u("9"), &u("0"), false).unwrap();
    assert!(!flipped);
    assert_eq!(tick.liquidity_gross, u("8"));
    // Checkpoint stays at the value captured on first initialization.
    assert_eq!(tick.fee_growth_outside0, s("7"));
}

#[test]
fn emptying_a_tick_flips_it_back() {
    let mut tick = TickData::empty("pool", -60);
    tick.update(0, &s("5"), &u("0"), &u("0"), false).unwrap();
    let flipped = tick.update(0, &s("-5"), &u("0"), &u("0"), false).unwrap();
    assert!(flipped);
    assert!(!tick.initialized);
    assert!(tick.liquidity_gross.is_zero());
}

#[test]
fn removing_more_than_gross_is_an_error() {
    let mut tick = TickData::empty("pool", 0);
    tick.update(0, &s("5"), &u("0"), &u("0"), false).unwrap();
    assert!(tick.update(0, &s("-6"), &u("0"), &u("0"), false).is_err());
}

#[test]
fn crossing_flips_the_outside_checkpoints() {
    let mut tick = TickData::empty("pool", -60);
    tick.update(0, &s("5"), &u("10"), &u("20"), false).unwrap();

    let net = tick.cross(&u("50"), &u("80"));
    assert_eq!(net, s("5"));
    assert_eq!(tick.fee_growth_outside0, s("40"));
    assert_eq!(tick.fee_growth_outside1, s("60"));

    // Crossing back restores the original frame against the same globals.
    tick.cross(&u("50"), &u("80"));
    assert_eq!(tick.fee_growth_outside0, s("10"));
    assert_eq!(tick.fee_growth_outside1, s("20"));
}

#[test]
fn fee_growth_inside_in_range() {
    let mut lower = TickData::empty("pool", -60);
    lower.update(0, &s("1"), &u("10"), &u("0"), false).unwrap();
    let mut upper = TickData::empty("pool", 60);
    upper.update(0, &s("1"), &u("10"), &u("0"), true).unwrap();

    // Current tick inside the range: inside = global - below - above.
    let (inside0, _) = fee_growth_inside(&lower, &upper, 0, &u("25"), &u("0"));
    assert_eq!(inside0, s("15"));
}

#[test]
fn fee_growth_inside_outside_the_range() {
    let mut lower = TickData::empty("pool", -60);
    lower.update(0, &s("1"), &u("10"), &u("0"), false).unwrap();
    let mut upper = TickData::empty("pool", 60);
    upper.update(0, &s("1"), &u("10"), &u("0"), true).unwrap();

    // Price below the range: growth beyond the lower checkpoint counts as
    // "below" and only the checkpointed 10 remain attributed inside.
    let (inside0, _) = fee_growth_inside(&lower, &upper, -100, &u("25"), &u("0"));
    assert_eq!(inside0, s("10"));
    // Price above the range: the whole global growth sits below/above and
    // the signed inside value goes negative until a cross re-frames it.
    let (inside0, _) = fee_growth_inside(&lower, &upper, 100, &u("25"), &u("0"));
    assert_eq!(inside0, s("-10"));
}

#[test]
fn inside_growth_is_consistent_across_a_cross() {
    // A range position watches fees accrue only while the price is inside.
    let mut lower = TickData::empty("pool", -60);
    lower.update(0, &s("1"), &u("0"), &u("0"), false).unwrap();
    let mut upper = TickData::empty("pool", 60);
    upper.update(0, &s("1"), &u("0"), &u("0"), true).unwrap();

    let (before, _) = fee_growth_inside(&lower, &upper, 0, &u("5"), &u("0"));

    // Price falls through the lower tick after 2 more units of growth, then
    // 10 units accrue below the range.
    lower.cross(&u("7"), &u("0"));
    let (after, _) = fee_growth_inside(&lower, &upper, -100, &u("17"), &u("0"));

    // Inside growth advanced by exactly the 2 units earned while in range.
    assert_eq!(after.sub(&before), s("2"));
}
