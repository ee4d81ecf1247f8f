//! Fee and principal withdrawal: `CollectPositionFees` for positions,
//! `CollectProtocolFees` for the protocol's accrued share.

use amm_math::UDecimal;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::dto::{CollectPositionFeesDto, CollectProtocolFeesDto};
use crate::errors::{DexError, DexResult};
use crate::keys;
use crate::ledger::{get_object, put_object, require_object, Ledger, TokenLedger};
use crate::pool::DexFeeConfig;
use crate::position::UserPositionIndex;
use crate::tick::{fee_growth_inside, TickData};

use super::{load_pool, load_tick, payout_amount, resolve_position, save_pool, save_position};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResult {
    pub amount0: UDecimal,
    pub amount1: UDecimal,
}

/// Withdraws accrued fees (and burned principal) from a position.
///
/// Fees are synchronised first through a zero-delta position update, so the
/// amounts collected reflect everything earned up to the current fee growth;
/// the checkpoints advance exactly once. Requests are clamped to what is owed
/// and to what the pool account actually holds. A position that empties to
/// dust is deleted along with its index entry.
pub fn collect_position_fees(
    ledger: &mut dyn Ledger,
    tokens: &mut dyn TokenLedger,
    caller: &str,
    dto: &CollectPositionFeesDto,
) -> DexResult<CollectResult> {
    dto.validate()?;
    let pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    let pool_hash = pool.pool_hash();
    let pool_account = pool.pool_alias();

    let mut position = resolve_position(
        ledger,
        &pool_hash,
        caller,
        dto.tick_lower,
        dto.tick_upper,
        dto.position_id.as_deref(),
    )?;

    // Fee sync before any clamping: settle growth since the last checkpoint.
    let tick_current = pool.current_tick();
    let lower = load_tick(ledger, &pool_hash, dto.tick_lower)?
        .unwrap_or_else(|| TickData::empty(&pool_hash, dto.tick_lower));
    let upper = load_tick(ledger, &pool_hash, dto.tick_upper)?
        .unwrap_or_else(|| TickData::empty(&pool_hash, dto.tick_upper));
    let (inside0, inside1) = fee_growth_inside(
        &lower,
        &upper,
        tick_current,
        &pool.fee_growth_global0,
        &pool.fee_growth_global1,
    );
    position.update(&amm_math::SDecimal::zero(), &inside0, &inside1)?;

    let balance0 = tokens.fetch_or_create_balance(&pool_account, &pool.token0)?;
    let balance1 = tokens.fetch_or_create_balance(&pool_account, &pool.token1)?;
    let amount0 = dto
        .amount0_requested
        .clone()
        .min(position.tokens_owed0.clone())
        .min(balance0.clone());
    let amount1 = dto
        .amount1_requested
        .clone()
        .min(position.tokens_owed1.clone())
        .min(balance1.clone());

    position.tokens_owed0 = position.tokens_owed0.sub(&amount0)?;
    position.tokens_owed1 = position.tokens_owed1.sub(&amount1)?;

    let pay0 = payout_amount(&amount0);
    let pay1 = payout_amount(&amount1);
    if !pay0.is_zero() {
        tokens.transfer_token(&pool_account, caller, &pool.token0, &pay0)?;
    }
    if !pay1.is_zero() {
        tokens.transfer_token(&pool_account, caller, &pool.token1, &pay1)?;
    }

    if position.is_dust() {
        let position_key = keys::position_key(
            &pool_hash,
            position.tick_upper,
            position.tick_lower,
            &position.position_id,
        );
        ledger.delete(&position_key)?;
        let index_key = keys::user_position_index_key(caller, &pool_hash);
        if let Some(mut index) = get_object::<UserPositionIndex>(ledger, &index_key)? {
            index.remove(&position.tick_range(), &position.position_id);
            if index.is_empty() {
                ledger.delete(&index_key)?;
            } else {
                put_object(ledger, &index_key, &index)?;
            }
        }
        debug!("deleted dust position {}", position.position_id);
    } else {
        save_position(ledger, &position)?;
    }

    Ok(CollectResult {
        amount0: pay0,
        amount1: pay1,
    })
}

/// Withdraws accrued protocol fees to a recipient; fee authorities only.
pub fn collect_protocol_fees(
    ledger: &mut dyn Ledger,
    tokens: &mut dyn TokenLedger,
    caller: &str,
    dto: &CollectProtocolFeesDto,
) -> DexResult<CollectResult> {
    dto.validate()?;
    let config: DexFeeConfig = require_object(ledger, &keys::dex_fee_config_key())?;
    if !config.is_authority(caller) {
        return Err(DexError::Unauthorized(format!(
            "{caller} is not a fee authority"
        )));
    }

    let mut pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    let pool_account = pool.pool_alias();

    let balance0 = tokens.fetch_or_create_balance(&pool_account, &pool.token0)?;
    let balance1 = tokens.fetch_or_create_balance(&pool_account, &pool.token1)?;
    let amount0 = dto
        .amount0_requested
        .clone()
        .min(pool.protocol_fees_token0.clone())
        .min(balance0.clone());
    let amount1 = dto
        .amount1_requested
        .clone()
        .min(pool.protocol_fees_token1.clone())
        .min(balance1.clone());

    pool.protocol_fees_token0 = pool.protocol_fees_token0.sub(&amount0)?;
    pool.protocol_fees_token1 = pool.protocol_fees_token1.sub(&amount1)?;

    let pay0 = payout_amount(&amount0);
    let pay1 = payout_amount(&amount1);
    if !pay0.is_zero() {
        tokens.transfer_token(&pool_account, &dto.recipient, &pool.token0, &pay0)?;
    }
    if !pay1.is_zero() {
        tokens.transfer_token(&pool_account, &dto.recipient, &pool.token1, &pay1)?;
    }

    save_pool(ledger, &pool)?;
    Ok(CollectResult {
        amount0: pay0,
        amount1: pay1,
    })
}
