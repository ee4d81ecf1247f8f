//! Range-liquidity changes: `AddLiquidity` (mint) and `RemoveLiquidity`
//! (burn).
//!
//! Both walk the same path: update the boundary ticks (flipping bitmap bits
//! as ticks initialize or empty), derive the fee growth inside the range from
//! the updated ticks, settle the position against it, and finally compute the
//! token amounts the change is worth at the current price. A burn never
//! transfers; it accrues into `tokens_owed` for a later `collect`.

use amm_math::sqrt_price_math::{get_amount0_delta, get_amount1_delta};
use amm_math::liquidity_math::get_liquidity_for_amounts;
use amm_math::{tick_math, SDecimal, UDecimal};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::dto::{AddLiquidityDto, RemoveLiquidityDto};
use crate::errors::{DexError, DexResult};
use crate::keys;
use crate::ledger::{get_object, put_object, Ledger, TokenLedger};
use crate::pool::Pool;
use crate::position::{Position, UserPositionIndex};
use crate::tick::{fee_growth_inside, TickData};
use crate::tick_bitmap;

use super::{
    delete_tick, deposit_amount, derive_position_id, load_pool, load_tick, resolve_position,
    save_pool, save_position, save_tick,
};

/// Outcome of a liquidity change, amounts always non-negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityResult {
    pub position_id: String,
    pub liquidity_delta: UDecimal,
    pub amount0: UDecimal,
    pub amount1: UDecimal,
}

/// Token amounts a liquidity delta is worth, given where the current tick
/// sits relative to the range. `round_up` for deposits, down for burns.
fn range_amounts(
    pool: &Pool,
    tick_current: i32,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: &UDecimal,
    round_up: bool,
) -> DexResult<(UDecimal, UDecimal)> {
    let sqrt_lower = tick_math::tick_to_sqrt_price(tick_lower)?;
    let sqrt_upper = tick_math::tick_to_sqrt_price(tick_upper)?;

    if tick_current < tick_lower {
        // Entirely above the current price: token0 only.
        let amount0 = get_amount0_delta(&sqrt_lower, &sqrt_upper, liquidity, round_up)?;
        Ok((amount0, UDecimal::zero()))
    } else if tick_current < tick_upper {
        let amount0 = get_amount0_delta(&pool.sqrt_price, &sqrt_upper, liquidity, round_up)?;
        let amount1 = get_amount1_delta(&sqrt_lower, &pool.sqrt_price, liquidity, round_up)?;
        Ok((amount0, amount1))
    } else {
        // Entirely below the current price: token1 only.
        let amount1 = get_amount1_delta(&sqrt_lower, &sqrt_upper, liquidity, round_up)?;
        Ok((UDecimal::zero(), amount1))
    }
}

/// Applies a signed liquidity delta to both boundary ticks and the position,
/// keeping the bitmap in lock-step with tick initialization. Ticks that empty
/// out are deleted.
fn apply_liquidity_change(
    ledger: &mut dyn Ledger,
    pool: &mut Pool,
    position: &mut Position,
    liquidity_delta: &SDecimal,
) -> DexResult<()> {
    let pool_hash = pool.pool_hash();
    let tick_current = pool.current_tick();
    let (tick_lower, tick_upper) = (position.tick_lower, position.tick_upper);

    let mut lower = load_tick(ledger, &pool_hash, tick_lower)?
        .unwrap_or_else(|| TickData::empty(&pool_hash, tick_lower));
    let mut upper = load_tick(ledger, &pool_hash, tick_upper)?
        .unwrap_or_else(|| TickData::empty(&pool_hash, tick_upper));

    let flipped_lower = lower.update(
        tick_current,
        liquidity_delta,
        &pool.fee_growth_global0,
        &pool.fee_growth_global1,
        false,
    )?;
    let flipped_upper = upper.update(
        tick_current,
        liquidity_delta,
        &pool.fee_growth_global0,
        &pool.fee_growth_global1,
        true,
    )?;
    if flipped_lower {
        tick_bitmap::flip_tick(&mut pool.bitmap, tick_lower, pool.tick_spacing)?;
    }
    if flipped_upper {
        tick_bitmap::flip_tick(&mut pool.bitmap, tick_upper, pool.tick_spacing)?;
    }

    let (inside0, inside1) = fee_growth_inside(
        &lower,
        &upper,
        tick_current,
        &pool.fee_growth_global0,
        &pool.fee_growth_global1,
    );
    position.update(liquidity_delta, &inside0, &inside1)?;

    if lower.initialized {
        save_tick(ledger, &lower)?;
    } else {
        delete_tick(ledger, &pool_hash, tick_lower)?;
    }
    if upper.initialized {
        save_tick(ledger, &upper)?;
    } else {
        delete_tick(ledger, &pool_hash, tick_upper)?;
    }

    // Active liquidity tracks only in-range positions.
    if tick_current >= tick_lower && tick_current < tick_upper {
        pool.liquidity = pool
            .liquidity
            .to_signed()
            .add(liquidity_delta)
            .into_unsigned()
            .map_err(|_| DexError::Conflict("pool liquidity below zero".into()))?;
    }
    Ok(())
}

fn upsert_user_index(
    ledger: &mut dyn Ledger,
    position: &Position,
) -> DexResult<()> {
    let key = keys::user_position_index_key(&position.owner, &position.pool_hash);
    let mut index: UserPositionIndex = get_object(ledger, &key)?
        .unwrap_or_else(|| UserPositionIndex::new(&position.owner, &position.pool_hash));
    index.insert(&position.tick_range(), &position.position_id);
    put_object(ledger, &key, &index)
}

/// Mints liquidity into a range. The liquidity figure is derived from the
/// desired amounts at the current price; the actual amounts charged are
/// checked against the DTO minimums.
pub fn add_liquidity(
    ledger: &mut dyn Ledger,
    tokens: &mut dyn TokenLedger,
    caller: &str,
    dto: &AddLiquidityDto,
) -> DexResult<LiquidityResult> {
    dto.validate()?;
    let mut pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    if !pool.can_provide_liquidity(caller) {
        return Err(DexError::Unauthorized(format!(
            "{caller} is not whitelisted for this private pool"
        )));
    }
    let pool_hash = pool.pool_hash();

    let sqrt_lower = tick_math::tick_to_sqrt_price(dto.tick_lower)?;
    let sqrt_upper = tick_math::tick_to_sqrt_price(dto.tick_upper)?;
    let liquidity_delta = get_liquidity_for_amounts(
        &pool.sqrt_price,
        &sqrt_lower,
        &sqrt_upper,
        &dto.amount0_desired,
        &dto.amount1_desired,
    )?;
    if liquidity_delta.is_zero() {
        return Err(DexError::ValidationFailed(
            "desired amounts are worth zero liquidity on this range".into(),
        ));
    }

    let position_id = dto.position_id.clone().unwrap_or_else(|| {
        derive_position_id(
            caller,
            &pool_hash,
            dto.tick_lower,
            dto.tick_upper,
            &dto.unique_key,
        )
    });
    let mut position = match super::load_position(
        ledger,
        &pool_hash,
        dto.tick_upper,
        dto.tick_lower,
        &position_id,
    )? {
        Some(existing) => {
            if existing.owner != caller {
                return Err(DexError::Unauthorized(format!(
                    "position {position_id} is not held by {caller}"
                )));
            }
            existing
        }
        None => Position::new(&pool_hash, caller, dto.tick_lower, dto.tick_upper, &position_id),
    };

    apply_liquidity_change(ledger, &mut pool, &mut position, &liquidity_delta.to_signed())?;

    let tick_current = pool.current_tick();
    let (amount0, amount1) = range_amounts(
        &pool,
        tick_current,
        dto.tick_lower,
        dto.tick_upper,
        &liquidity_delta,
        true,
    )?;
    if amount0 < dto.amount0_min || amount1 < dto.amount1_min {
        return Err(DexError::Slippage(format!(
            "amounts {amount0}/{amount1} fell below minimums {}/{}",
            dto.amount0_min, dto.amount1_min
        )));
    }

    save_position(ledger, &position)?;
    upsert_user_index(ledger, &position)?;
    save_pool(ledger, &pool)?;

    let pool_account = pool.pool_alias();
    let pay0 = deposit_amount(&amount0);
    let pay1 = deposit_amount(&amount1);
    if !pay0.is_zero() {
        tokens.transfer_token(caller, &pool_account, &pool.token0, &pay0)?;
    }
    if !pay1.is_zero() {
        tokens.transfer_token(caller, &pool_account, &pool.token1, &pay1)?;
    }

    debug!(
        "minted {liquidity_delta} liquidity on [{}, {}] for {caller}",
        dto.tick_lower, dto.tick_upper
    );
    Ok(LiquidityResult {
        position_id,
        liquidity_delta,
        amount0: pay0,
        amount1: pay1,
    })
}

/// Burns liquidity from a position. The withdrawn principal accrues into
/// `tokens_owed`; withdrawal itself happens via `collect`.
pub fn remove_liquidity(
    ledger: &mut dyn Ledger,
    caller: &str,
    dto: &RemoveLiquidityDto,
) -> DexResult<LiquidityResult> {
    dto.validate()?;
    let mut pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    let pool_hash = pool.pool_hash();

    let mut position = resolve_position(
        ledger,
        &pool_hash,
        caller,
        dto.tick_lower,
        dto.tick_upper,
        dto.position_id.as_deref(),
    )?;
    if dto.amount > position.liquidity {
        return Err(DexError::Conflict(format!(
            "cannot burn {} from a position holding {}",
            dto.amount, position.liquidity
        )));
    }

    apply_liquidity_change(
        ledger,
        &mut pool,
        &mut position,
        &dto.amount.to_signed().neg(),
    )?;

    let tick_current = pool.current_tick();
    let (amount0, amount1) = range_amounts(
        &pool,
        tick_current,
        dto.tick_lower,
        dto.tick_upper,
        &dto.amount,
        false,
    )?;
    position.tokens_owed0 = position.tokens_owed0.add(&amount0);
    position.tokens_owed1 = position.tokens_owed1.add(&amount1);

    save_position(ledger, &position)?;
    save_pool(ledger, &pool)?;

    debug!(
        "burned {} liquidity on [{}, {}] for {caller}",
        dto.amount, dto.tick_lower, dto.tick_upper
    );
    Ok(LiquidityResult {
        position_id: position.position_id.clone(),
        liquidity_delta: dto.amount.clone(),
        amount0,
        amount1,
    })
}
