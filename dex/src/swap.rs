//! The swap engine: tick-by-tick traversal of the bitmap, one
//! `compute_swap_step` per tick range, fee and protocol-fee accrual, tick
//! crossing, and terminal writeback values.
//!
//! The engine is pure over its inputs: it reads the pool and a
//! [`TickDataSource`], and returns everything that changed in a
//! [`SwapOutcome`]. Callers persist the outcome (the swap operation) or throw
//! it away (the quote engine); either way no state moves until the whole
//! computation has succeeded.

use amm_math::swap_math::compute_swap_step;
use amm_math::tick_math::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use amm_math::{tick_math, Rounding, SDecimal, UDecimal, MAX_TICK, MIN_TICK};
use log::debug;

use crate::errors::{DexError, DexResult};
use crate::pool::{Pool, PROTOCOL_FEE_DENOMINATOR};
use crate::tick::TickData;
use crate::tick_bitmap;

/// Supplies tick data during a swap; `None` for ticks never initialized.
///
/// The ledger-backed implementation reads through to storage; the quote
/// engine serves from an in-memory snapshot.
pub trait TickDataSource {
    fn tick_data(&mut self, pool_hash: &str, tick: i32) -> DexResult<Option<TickData>>;
}

/// Swap request as seen by the engine: direction, signed amount
/// (positive = exact input, negative = exact output), and a price bound.
#[derive(Debug, Clone)]
pub struct SwapParams {
    pub zero_for_one: bool,
    pub amount_specified: SDecimal,
    pub sqrt_price_limit: UDecimal,
}

/// Everything a swap changed, ready for writeback.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    /// Signed token0 flow: positive into the pool, negative out of it.
    pub amount0: SDecimal,
    /// Signed token1 flow, same convention.
    pub amount1: SDecimal,
    pub sqrt_price: UDecimal,
    pub tick: i32,
    pub liquidity: UDecimal,
    pub fee_growth_global0: UDecimal,
    pub fee_growth_global1: UDecimal,
    pub protocol_fees_token0: UDecimal,
    pub protocol_fees_token1: UDecimal,
    /// Ticks whose outside checkpoints flipped during the swap.
    pub crossed_ticks: Vec<TickData>,
}

/// Rejects limits on the wrong side of the current price or outside the
/// admissible sqrt-price range.
pub fn validate_sqrt_price_limit(
    limit: &UDecimal,
    current: &UDecimal,
    zero_for_one: bool,
) -> DexResult<()> {
    let valid = if zero_for_one {
        limit < current && limit >= &*MIN_SQRT_RATIO
    } else {
        limit > current && limit <= &*MAX_SQRT_RATIO
    };
    if valid {
        Ok(())
    } else {
        Err(DexError::ValidationFailed(format!(
            "sqrt price limit {limit} invalid against current price {current} \
             for {} swap",
            if zero_for_one { "0->1" } else { "1->0" }
        )))
    }
}

/// Runs the swap state machine against a consistent snapshot of the pool.
pub fn execute_swap(
    pool: &Pool,
    ticks: &mut dyn TickDataSource,
    params: &SwapParams,
) -> DexResult<SwapOutcome> {
    if params.amount_specified.is_zero() {
        return Err(DexError::ValidationFailed(
            "swap amount must be non-zero".into(),
        ));
    }
    validate_sqrt_price_limit(&params.sqrt_price_limit, &pool.sqrt_price, params.zero_for_one)?;

    let pool_hash = pool.pool_hash();
    let exact_in = !params.amount_specified.is_negative();
    let zero_for_one = params.zero_for_one;

    let mut remaining = params.amount_specified.clone();
    let mut calculated = UDecimal::zero();
    let mut sqrt_price = pool.sqrt_price.clone();
    let mut tick = pool.tick;
    let mut liquidity = pool.liquidity.clone();
    // Only the input-side accumulator advances during a swap.
    let mut fee_growth_global_in = if zero_for_one {
        pool.fee_growth_global0.clone()
    } else {
        pool.fee_growth_global1.clone()
    };
    let mut protocol_fee = UDecimal::zero();
    let mut crossed_ticks: Vec<TickData> = Vec::new();

    while !remaining.is_zero() && sqrt_price != params.sqrt_price_limit {
        let sqrt_price_start = sqrt_price.clone();

        let (tick_next_raw, initialized) = tick_bitmap::next_initialized_tick_within_one_word(
            &pool.bitmap,
            tick,
            pool.tick_spacing,
            zero_for_one,
        )?;
        let tick_next = tick_next_raw.clamp(MIN_TICK, MAX_TICK);

        let sqrt_price_next_tick = tick_math::tick_to_sqrt_price(tick_next)?;
        // Bound the step target by the overall price limit.
        let sqrt_price_target = if zero_for_one {
            sqrt_price_next_tick.clone().max(params.sqrt_price_limit.clone())
        } else {
            sqrt_price_next_tick.clone().min(params.sqrt_price_limit.clone())
        };

        let step = compute_swap_step(&sqrt_price, &sqrt_price_target, &liquidity, &remaining, pool.fee)?;
        sqrt_price = step.sqrt_price_next.clone();

        if exact_in {
            // Ceil rounding of the fee gross-up can overshoot the remainder
            // by one ulp when a tick target is almost exactly affordable;
            // the remainder floors at zero.
            let consumed = step.amount_in.add(&step.fee_amount);
            remaining = if consumed.to_signed() >= remaining {
                SDecimal::zero()
            } else {
                remaining.sub(&consumed.to_signed())
            };
            calculated = calculated.add(&step.amount_out);
        } else {
            remaining = remaining.add(&step.amount_out.to_signed());
            calculated = calculated.add(&step.amount_in.add(&step.fee_amount));
        }

        if !step.fee_amount.is_zero() {
            let fee_for_liquidity = if pool.protocol_fee_bps > 0 {
                let share = step
                    .fee_amount
                    .mul(&UDecimal::from_u64(u64::from(pool.protocol_fee_bps)))
                    .div(
                        &UDecimal::from_u64(u64::from(PROTOCOL_FEE_DENOMINATOR)),
                        Rounding::Floor,
                    )?;
                protocol_fee = protocol_fee.add(&share);
                step.fee_amount.sub(&share)?
            } else {
                step.fee_amount.clone()
            };
            if !liquidity.is_zero() {
                fee_growth_global_in =
                    fee_growth_global_in.add(&fee_for_liquidity.div(&liquidity, Rounding::HalfUp)?);
            }
        }

        if sqrt_price == sqrt_price_next_tick {
            if initialized {
                let mut tick_data = ticks
                    .tick_data(&pool_hash, tick_next)?
                    .unwrap_or_else(|| TickData::empty(&pool_hash, tick_next));
                let (global0, global1) = if zero_for_one {
                    (fee_growth_global_in.clone(), pool.fee_growth_global1.clone())
                } else {
                    (pool.fee_growth_global0.clone(), fee_growth_global_in.clone())
                };
                let liquidity_net = tick_data.cross(&global0, &global1);
                let delta = if zero_for_one {
                    liquidity_net.neg()
                } else {
                    liquidity_net
                };
                liquidity = liquidity
                    .to_signed()
                    .add(&delta)
                    .into_unsigned()
                    .map_err(|_| {
                        DexError::Conflict(format!(
                            "crossing tick {tick_next} drove active liquidity negative"
                        ))
                    })?;
                debug!(
                    "crossed tick {tick_next}, liquidity now {liquidity}",
                );
                crossed_ticks.push(tick_data);
            }
            tick = if zero_for_one { tick_next - 1 } else { tick_next };
        } else if sqrt_price != sqrt_price_start {
            tick = tick_math::sqrt_price_to_tick(&sqrt_price)?;
        }

        // No price movement, nothing consumed, and no tick boundary reached
        // (reaching one re-anchors `tick` and is progress in itself): another
        // iteration cannot do better, stop instead of spinning.
        if sqrt_price == sqrt_price_start
            && sqrt_price != sqrt_price_next_tick
            && step.amount_in.is_zero()
            && step.amount_out.is_zero()
            && step.fee_amount.is_zero()
        {
            break;
        }
    }

    // Signed flows: the input side is what the trader paid in (positive),
    // the output side what the pool paid out (negative).
    let specified_consumed = params.amount_specified.sub(&remaining);
    let (input_signed, output_signed) = if exact_in {
        (specified_consumed, calculated.to_signed().neg())
    } else {
        (calculated.to_signed(), specified_consumed)
    };
    let (amount0, amount1) = if zero_for_one {
        (input_signed, output_signed)
    } else {
        (output_signed, input_signed)
    };

    let (fee_growth_global0, fee_growth_global1) = if zero_for_one {
        (fee_growth_global_in, pool.fee_growth_global1.clone())
    } else {
        (pool.fee_growth_global0.clone(), fee_growth_global_in)
    };
    let (protocol_fees_token0, protocol_fees_token1) = if zero_for_one {
        (
            pool.protocol_fees_token0.add(&protocol_fee),
            pool.protocol_fees_token1.clone(),
        )
    } else {
        (
            pool.protocol_fees_token0.clone(),
            pool.protocol_fees_token1.add(&protocol_fee),
        )
    };

    Ok(SwapOutcome {
        amount0,
        amount1,
        sqrt_price,
        tick,
        liquidity,
        fee_growth_global0,
        fee_growth_global1,
        protocol_fees_token0,
        protocol_fees_token1,
        crossed_ticks,
    })
}
