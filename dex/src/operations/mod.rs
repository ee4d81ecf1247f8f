//! Pool operations: one module per externally visible primitive, plus the
//! shared entity-loading plumbing they all use.

pub mod collect;
pub mod create_pool;
pub mod limit_orders;
pub mod liquidity;
pub mod maintenance;
pub mod protocol;
pub mod queries;
pub mod quote_op;
pub mod swap_op;

use amm_math::{Rounding, UDecimal};
use sha2::{Digest, Sha256};

use crate::errors::{DexError, DexResult};
use crate::keys;
use crate::ledger::{get_object, put_object, require_object, Ledger};
use crate::pool::{Pool, TokenKey};
use crate::position::Position;
use crate::tick::TickData;

pub(crate) fn load_pool(
    ledger: &dyn Ledger,
    token0: &TokenKey,
    token1: &TokenKey,
    fee: u32,
) -> DexResult<Pool> {
    let key = keys::pool_key(token0, token1, fee);
    get_object(ledger, &key)?.ok_or_else(|| {
        DexError::NotFound(format!("pool {token0}/{token1}/{fee} does not exist"))
    })
}

pub(crate) fn save_pool(ledger: &mut dyn Ledger, pool: &Pool) -> DexResult<()> {
    let key = keys::pool_key(&pool.token0, &pool.token1, pool.fee);
    put_object(ledger, &key, pool)
}

pub(crate) fn load_tick(
    ledger: &dyn Ledger,
    pool_hash: &str,
    tick: i32,
) -> DexResult<Option<TickData>> {
    get_object(ledger, &keys::tick_data_key(pool_hash, tick))
}

pub(crate) fn save_tick(ledger: &mut dyn Ledger, tick: &TickData) -> DexResult<()> {
    put_object(ledger, &keys::tick_data_key(&tick.pool_hash, tick.tick), tick)
}

pub(crate) fn delete_tick(ledger: &mut dyn Ledger, pool_hash: &str, tick: i32) -> DexResult<()> {
    ledger.delete(&keys::tick_data_key(pool_hash, tick))
}

pub(crate) fn save_position(ledger: &mut dyn Ledger, position: &Position) -> DexResult<()> {
    let key = keys::position_key(
        &position.pool_hash,
        position.tick_upper,
        position.tick_lower,
        &position.position_id,
    );
    put_object(ledger, &key, position)
}

pub(crate) fn load_position(
    ledger: &dyn Ledger,
    pool_hash: &str,
    tick_upper: i32,
    tick_lower: i32,
    position_id: &str,
) -> DexResult<Option<Position>> {
    get_object(
        ledger,
        &keys::position_key(pool_hash, tick_upper, tick_lower, position_id),
    )
}

/// Resolves a position by explicit id, or through the caller's index when the
/// DTO omitted it (only unambiguous when the caller holds exactly one
/// position on the range).
pub(crate) fn resolve_position(
    ledger: &dyn Ledger,
    pool_hash: &str,
    owner: &str,
    tick_lower: i32,
    tick_upper: i32,
    position_id: Option<&str>,
) -> DexResult<Position> {
    let id = match position_id {
        Some(id) => id.to_string(),
        None => {
            let index: crate::position::UserPositionIndex = require_object(
                ledger,
                &keys::user_position_index_key(owner, pool_hash),
            )?;
            let range = format!("{tick_lower}:{tick_upper}");
            let ids = index.ranges.get(&range).ok_or_else(|| {
                DexError::NotFound(format!("no position on range {range} for {owner}"))
            })?;
            match ids.as_slice() {
                [single] => single.clone(),
                [] => {
                    return Err(DexError::NotFound(format!(
                        "no position on range {range} for {owner}"
                    )))
                }
                _ => {
                    return Err(DexError::ValidationFailed(format!(
                        "multiple positions on range {range}; positionId required"
                    )))
                }
            }
        }
    };
    let position = load_position(ledger, pool_hash, tick_upper, tick_lower, &id)?
        .ok_or_else(|| DexError::NotFound(format!("position {id} does not exist")))?;
    if position.owner != owner {
        return Err(DexError::Unauthorized(format!(
            "position {id} is not held by {owner}"
        )));
    }
    Ok(position)
}

/// Deterministic position id for a first mint without a client-supplied one.
pub(crate) fn derive_position_id(
    owner: &str,
    pool_hash: &str,
    tick_lower: i32,
    tick_upper: i32,
    unique_key: &str,
) -> String {
    let seed = format!("{owner}|{pool_hash}|{tick_lower}|{tick_upper}|{unique_key}");
    let digest = hex::encode(Sha256::digest(seed.as_bytes()));
    digest[..32].to_string()
}

/// Deposits round up to token decimals so the pool is never short-changed;
/// payouts truncate down.
pub(crate) fn deposit_amount(amount: &UDecimal) -> UDecimal {
    amount.round(amm_math::TOKEN_DECIMALS, Rounding::Ceil)
}

pub(crate) fn payout_amount(amount: &UDecimal) -> UDecimal {
    amount.f18()
}
