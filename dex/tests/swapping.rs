//! Swap engine end to end: exact amounts, fee accrual, tick crossing,
//! slippage, and the quote engine's purity.

mod common;

use amm_dex::dto::{GetPoolDto, GetTickDataDto, QuoteExactAmountDto, SwapDto};
use amm_dex::errors::DexError;
use amm_dex::operations::queries::{get_pool_data, get_tick_data};
use amm_dex::operations::quote_op::quote;
use amm_dex::operations::swap_op::swap;
use amm_math::tick_math::MIN_SQRT_RATIO;
use amm_math::{SDecimal, UDecimal};

use common::*;

fn pool_dto() -> GetPoolDto {
    GetPoolDto {
        token0: gala(),
        token1: usdc(),
        fee: 3000,
    }
}

fn swap_dto(amount: &str, zero_for_one: bool, limit: &str) -> SwapDto {
    SwapDto {
        token0: gala(),
        token1: usdc(),
        fee: 3000,
        amount: s(amount),
        zero_for_one,
        sqrt_price_limit: u(limit),
        amount_in_maximum: None,
        amount_out_minimum: None,
        recipient: None,
        unique_key: format!("swap-{amount}-{zero_for_one}"),
    }
}

/// Medium-fee pool with one unit-ish of liquidity on [-60, 60].
fn pool_with_range_liquidity(h: &mut Harness) -> UDecimal {
    h.create_pool_at_one(gala(), usdc(), 3000);
    let minted = h.mint(
        ALICE, gala(), usdc(), 3000, -60, 60, "1", "1", "seed",
    );
    minted.liquidity_delta
}

#[test]
fn small_exact_in_swap_matches_the_worked_numbers() {
    let mut h = Harness::new();
    let liquidity = pool_with_range_liquidity(&mut h);
    assert_eq!(liquidity, u("333.85024970969944887556"));

    let result = swap(
        &mut h.ledger,
        &mut h.tokens,
        BOB,
        &swap_dto("0.01", true, "0.9"),
    )
    .unwrap();

    // The whole input is consumed: principal plus fee adds back to 0.01.
    assert_eq!(result.amount0, s("0.01"));
    assert_eq!(result.amount1, s("-0.00996970226791294095"));
    assert_eq!(result.new_sqrt_price, u("0.99997013720290285202"));

    let pool = get_pool_data(&h.ledger, &pool_dto()).unwrap();
    assert_eq!(pool.sqrt_price, u("0.99997013720290285202"));
    assert_eq!(pool.tick, -1);
    // Active liquidity is untouched inside the range.
    assert_eq!(pool.liquidity, liquidity);
    // Fee growth advanced by fee / liquidity on the input side only.
    assert_eq!(pool.fee_growth_global0, u("0.00000008986064867732"));
    assert!(pool.fee_growth_global1.is_zero());

    // Token conservation against the ledger: Bob paid 0.01 GALA and
    // received the truncated payout of USDC.
    assert_eq!(
        h.tokens.balance(BOB, &gala()),
        u("1000000").sub(&u("0.01")).unwrap()
    );
    assert_eq!(
        h.tokens.balance(BOB, &usdc()),
        u("1000000").add(&u("0.00996970226791294"))
    );
}

#[test]
fn monotone_fee_growth_over_successive_swaps() {
    let mut h = Harness::new();
    pool_with_range_liquidity(&mut h);

    let mut last = UDecimal::zero();
    for i in 0..3 {
        swap(
            &mut h.ledger,
            &mut h.tokens,
            BOB,
            &swap_dto("0.01", true, &format!("0.9{i}")),
        )
        .unwrap();
        let pool = get_pool_data(&h.ledger, &pool_dto()).unwrap();
        assert!(pool.fee_growth_global0 > last);
        last = pool.fee_growth_global0.clone();
    }
}

#[test]
fn crossing_the_range_boundary_empties_active_liquidity() {
    let mut h = Harness::new();
    let liquidity = pool_with_range_liquidity(&mut h);

    // Sell far more token0 than the range can absorb; the swap drains the
    // range, crosses -60, finds nothing below, and stops at the limit.
    let result = swap(
        &mut h.ledger,
        &mut h.tokens,
        BOB,
        &swap_dto("10", true, "0.9"),
    )
    .unwrap();

    let pool = get_pool_data(&h.ledger, &pool_dto()).unwrap();
    assert_eq!(pool.sqrt_price, u("0.9"));
    assert!(pool.liquidity.is_zero());
    assert!(pool.tick < -60);

    // Partial fill: less than the specified input was consumed.
    assert!(result.amount0.abs() < u("10"));
    assert!(result.amount1.is_negative());

    // The crossed tick flipped its outside checkpoints.
    let tick = get_tick_data(
        &h.ledger,
        &GetTickDataDto {
            token0: gala(),
            token1: usdc(),
            fee: 3000,
            tick: -60,
        },
    )
    .unwrap();
    assert!(tick.initialized);
    assert!(!tick.fee_growth_outside0.is_zero());

    // Swapping back the other way re-enters the range.
    let back = swap(
        &mut h.ledger,
        &mut h.tokens,
        BOB,
        &swap_dto("1", false, "1.5"),
    )
    .unwrap();
    assert!(back.amount1 > SDecimal::zero());
    let pool = get_pool_data(&h.ledger, &pool_dto()).unwrap();
    assert_eq!(pool.liquidity, liquidity);
    assert!(pool.tick >= -60);
}

#[test]
fn exact_output_swap_delivers_the_requested_amount() {
    let mut h = Harness::new();
    pool_with_range_liquidity(&mut h);

    let result = swap(
        &mut h.ledger,
        &mut h.tokens,
        BOB,
        &swap_dto("-0.005", true, "0.9"),
    )
    .unwrap();
    // Exactly the requested token1 comes out; token0 goes in with fee on top.
    assert_eq!(result.amount1, s("-0.005"));
    assert!(result.amount0 > s("0.005"));
}

#[test]
fn price_limit_validation() {
    let mut h = Harness::new();
    pool_with_range_liquidity(&mut h);

    // Limit on the wrong side of the current price.
    assert!(matches!(
        swap(&mut h.ledger, &mut h.tokens, BOB, &swap_dto("1", true, "1.1")),
        Err(DexError::ValidationFailed(_))
    ));
    assert!(matches!(
        swap(&mut h.ledger, &mut h.tokens, BOB, &swap_dto("1", false, "0.9")),
        Err(DexError::ValidationFailed(_))
    ));
    // Below the admissible range entirely.
    let mut dto = swap_dto("1", true, "0.9");
    dto.sqrt_price_limit = MIN_SQRT_RATIO.sub(&u("0.00000000000000000001")).unwrap();
    assert!(swap(&mut h.ledger, &mut h.tokens, BOB, &dto).is_err());
}

#[test]
fn slippage_bounds_are_enforced() {
    let mut h = Harness::new();
    pool_with_range_liquidity(&mut h);

    let mut dto = swap_dto("0.01", true, "0.9");
    dto.amount_out_minimum = Some(u("0.01"));
    assert!(matches!(
        swap(&mut h.ledger, &mut h.tokens, BOB, &dto),
        Err(DexError::Slippage(_))
    ));

    let mut dto = swap_dto("-0.005", true, "0.9");
    dto.amount_in_maximum = Some(u("0.005"));
    assert!(matches!(
        swap(&mut h.ledger, &mut h.tokens, BOB, &dto),
        Err(DexError::Slippage(_))
    ));

    // Generous bounds pass.
    let mut dto = swap_dto("0.01", true, "0.9");
    dto.amount_out_minimum = Some(u("0.009"));
    dto.amount_in_maximum = Some(u("0.011"));
    swap(&mut h.ledger, &mut h.tokens, BOB, &dto).unwrap();
}

#[test]
fn zero_liquidity_pool_moves_price_without_amounts() {
    let mut h = Harness::new();
    h.create_pool_at_one(gala(), usdc(), 3000);

    // No liquidity anywhere: the swap walks to its limit and nothing flows.
    let result = swap(
        &mut h.ledger,
        &mut h.tokens,
        BOB,
        &swap_dto("100", true, "0.9"),
    )
    .unwrap();
    assert!(result.amount0.is_zero());
    assert!(result.amount1.is_zero());
    let pool = get_pool_data(&h.ledger, &pool_dto()).unwrap();
    assert_eq!(pool.sqrt_price, u("0.9"));
    assert!(pool.fee_growth_global0.is_zero());
}

#[test]
fn quote_agrees_with_swap_and_writes_nothing() {
    let mut h = Harness::new();
    pool_with_range_liquidity(&mut h);
    let before = get_pool_data(&h.ledger, &pool_dto()).unwrap();

    let quoted = quote(
        &h.ledger,
        &QuoteExactAmountDto {
            token0: gala(),
            token1: usdc(),
            fee: 3000,
            amount: s("0.01"),
            zero_for_one: true,
            sqrt_price_limit: Some(u("0.9")),
            composite_pool: None,
        },
    )
    .unwrap();
    assert_eq!(quoted.current_sqrt_price, u("1"));
    assert_eq!(quoted.new_sqrt_price, u("0.99997013720290285202"));
    assert_eq!(quoted.amount0, s("0.01"));
    assert_eq!(quoted.amount1, s("-0.00996970226791294095"));

    // Quoting changed nothing on the ledger.
    let after = get_pool_data(&h.ledger, &pool_dto()).unwrap();
    assert_eq!(after.sqrt_price, before.sqrt_price);
    assert_eq!(after.fee_growth_global0, before.fee_growth_global0);

    // The real swap then reproduces the quoted amounts.
    let result = swap(
        &mut h.ledger,
        &mut h.tokens,
        BOB,
        &swap_dto("0.01", true, "0.9"),
    )
    .unwrap();
    assert_eq!(result.amount0, quoted.amount0);
    assert_eq!(result.amount1, quoted.amount1);
}

#[test]
fn protocol_fee_splits_off_the_lp_fee() {
    use amm_dex::dto::{ConfigureDexFeeAddressDto, SetProtocolFeeDto};
    use amm_dex::operations::protocol::{configure_dex_fee_address, set_protocol_fee};

    let mut h = Harness::new();
    configure_dex_fee_address(
        &mut h.ledger,
        ADMIN,
        &ConfigureDexFeeAddressDto {
            authorities: vec![ADMIN.into()],
            unique_key: "auth".into(),
        },
    )
    .unwrap();
    set_protocol_fee(
        &mut h.ledger,
        ADMIN,
        &SetProtocolFeeDto {
            protocol_fee: u("0.1"),
            unique_key: "fee".into(),
        },
    )
    .unwrap();

    // Pool created after the config snapshot carries the 10% split.
    pool_with_range_liquidity(&mut h);
    let pool = get_pool_data(&h.ledger, &pool_dto()).unwrap();
    assert_eq!(pool.protocol_fee_bps, 1000);

    swap(
        &mut h.ledger,
        &mut h.tokens,
        BOB,
        &swap_dto("0.01", true, "0.9"),
    )
    .unwrap();

    let pool = get_pool_data(&h.ledger, &pool_dto()).unwrap();
    // Fee was 0.00003; a tenth (floored) goes to the protocol, the rest
    // accrues to liquidity providers.
    assert_eq!(pool.protocol_fees_token0, u("0.00000300000000000004"));
    assert!(pool.protocol_fees_token1.is_zero());
    assert_eq!(pool.fee_growth_global0, u("0.00000008087458380959"));
}
