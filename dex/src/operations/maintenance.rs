//! Reconciliation helpers: bitmap rebuild and the unclaimed-funds sweep.
//! Both are authority-gated and touch pool invariants, so they live with the
//! engine rather than the host.

use amm_math::UDecimal;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dto::{TransferUnclaimedFundsDto, UpdateBitmapDto};
use crate::errors::{DexError, DexResult};
use crate::keys::{self, KEY_SEPARATOR};
use crate::ledger::{require_object, Ledger, TokenLedger};
use crate::pool::{DexFeeConfig, Pool};
use crate::position::POSITION_DUST;
use crate::tick_bitmap;

use super::{load_pool, payout_amount, save_pool};
use super::quote_op::load_all_ticks;

fn require_authority(ledger: &dyn Ledger, caller: &str) -> DexResult<()> {
    let config: DexFeeConfig = require_object(ledger, &keys::dex_fee_config_key())?;
    if !config.is_authority(caller) {
        return Err(DexError::Unauthorized(format!(
            "{caller} is not a fee authority"
        )));
    }
    Ok(())
}

/// Rebuilds a pool's bitmap from its stored tick data, restoring the
/// bitmap–tick consistency invariant after any suspected drift.
pub fn update_bitmap(
    ledger: &mut dyn Ledger,
    caller: &str,
    dto: &UpdateBitmapDto,
) -> DexResult<Pool> {
    dto.validate()?;
    require_authority(ledger, caller)?;

    let mut pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    let ticks = load_all_ticks(ledger, &pool.pool_hash())?;

    let mut bitmap = BTreeMap::new();
    for tick in ticks.values() {
        if tick.initialized {
            tick_bitmap::flip_tick(&mut bitmap, tick.tick, pool.tick_spacing)?;
        }
    }
    pool.bitmap = bitmap;
    save_pool(ledger, &pool)?;
    info!(
        "rebuilt bitmap for pool {}/{}/{} from {} ticks",
        pool.token0,
        pool.token1,
        pool.fee,
        ticks.len()
    );
    Ok(pool)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub amount0: UDecimal,
    pub amount1: UDecimal,
}

/// Sweeps pool-account balances that nothing can claim any more.
///
/// Only legal once every position is gone (no liquidity above the dust
/// threshold, nothing owed); accrued protocol fees stay behind for
/// `CollectProtocolFees`.
pub fn transfer_unclaimed_funds(
    ledger: &mut dyn Ledger,
    tokens: &mut dyn TokenLedger,
    caller: &str,
    dto: &TransferUnclaimedFundsDto,
) -> DexResult<SweepResult> {
    dto.validate()?;
    require_authority(ledger, caller)?;

    let pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    let pool_hash = pool.pool_hash();

    let prefix = format!(
        "{}{}{}{}",
        keys::object_type::POSITION,
        KEY_SEPARATOR,
        pool_hash,
        KEY_SEPARATOR
    );
    let mut bookmark: Option<String> = None;
    loop {
        let (page, next) = ledger.get_range(&prefix, bookmark.as_deref(), 64)?;
        for (_, bytes) in &page {
            let position: crate::position::Position = serde_json::from_slice(bytes)?;
            if position.liquidity >= *POSITION_DUST
                || !position.tokens_owed0.f18().is_zero()
                || !position.tokens_owed1.f18().is_zero()
            {
                return Err(DexError::Precondition(format!(
                    "position {} still holds value",
                    position.position_id
                )));
            }
        }
        match next {
            Some(mark) => bookmark = Some(mark),
            None => break,
        }
    }

    let pool_account = pool.pool_alias();
    let balance0 = tokens.fetch_or_create_balance(&pool_account, &pool.token0)?;
    let balance1 = tokens.fetch_or_create_balance(&pool_account, &pool.token1)?;
    // Everything beyond the protocol's accrued share is unclaimed.
    let sweep0 = payout_amount(&balance0.sub(&balance0.clone().min(pool.protocol_fees_token0.clone()))?);
    let sweep1 = payout_amount(&balance1.sub(&balance1.clone().min(pool.protocol_fees_token1.clone()))?);

    if !sweep0.is_zero() {
        tokens.transfer_token(&pool_account, &dto.recipient, &pool.token0, &sweep0)?;
    }
    if !sweep1.is_zero() {
        tokens.transfer_token(&pool_account, &dto.recipient, &pool.token1, &sweep1)?;
    }
    info!(
        "swept {sweep0} {} and {sweep1} {} of unclaimed funds",
        pool.token0, pool.token1
    );
    Ok(SweepResult {
        amount0: sweep0,
        amount1: sweep1,
    })
}
