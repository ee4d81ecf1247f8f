//! Read-only queries over pools, positions and ticks.

use amm_math::liquidity_math::{
    get_liquidity_for_amount0, get_liquidity_for_amount1,
};
use amm_math::sqrt_price_math::{get_amount0_delta, get_amount1_delta};
use amm_math::{tick_math, UDecimal};
use serde::{Deserialize, Serialize};

use crate::dto::{
    GetAddLiquidityEstimationDto, GetPoolDto, GetPositionByIdDto, GetRemoveLiquidityEstimationDto,
    GetTickDataDto, GetUserPositionsDto, MAX_USER_POSITIONS_PAGE,
};
use crate::errors::{DexError, DexResult};
use crate::keys::{self, KEY_SEPARATOR};
use crate::ledger::Ledger;
use crate::pool::Pool;
use crate::position::{Position, UserPositionIndex};
use crate::tick::TickData;

use super::{load_pool, load_tick, resolve_position};

/// The pool's price/liquidity head state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot0 {
    pub sqrt_price: UDecimal,
    pub tick: i32,
    pub liquidity: UDecimal,
}

pub fn get_slot0(ledger: &dyn Ledger, dto: &GetPoolDto) -> DexResult<Slot0> {
    let pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    Ok(Slot0 {
        tick: pool.current_tick(),
        sqrt_price: pool.sqrt_price.clone(),
        liquidity: pool.liquidity,
    })
}

pub fn get_liquidity(ledger: &dyn Ledger, dto: &GetPoolDto) -> DexResult<UDecimal> {
    Ok(load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?.liquidity)
}

pub fn get_pool_data(ledger: &dyn Ledger, dto: &GetPoolDto) -> DexResult<Pool> {
    load_pool(ledger, &dto.token0, &dto.token1, dto.fee)
}

/// Tick state at an index; an empty record when the tick was never
/// initialized.
pub fn get_tick_data(ledger: &dyn Ledger, dto: &GetTickDataDto) -> DexResult<TickData> {
    let pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    let pool_hash = pool.pool_hash();
    Ok(load_tick(ledger, &pool_hash, dto.tick)?
        .unwrap_or_else(|| TickData::empty(&pool_hash, dto.tick)))
}

/// One page of a pool's positions in key order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsPage {
    pub positions: Vec<Position>,
    pub bookmark: Option<String>,
}

pub fn get_positions(
    ledger: &dyn Ledger,
    dto: &GetPoolDto,
    bookmark: Option<&str>,
    limit: usize,
) -> DexResult<PositionsPage> {
    let pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    let prefix = format!(
        "{}{}{}{}",
        keys::object_type::POSITION,
        KEY_SEPARATOR,
        pool.pool_hash(),
        KEY_SEPARATOR
    );
    let (page, next) = ledger.get_range(&prefix, bookmark, limit)?;
    let positions = page
        .iter()
        .map(|(_, bytes)| serde_json::from_slice(bytes).map_err(DexError::from))
        .collect::<DexResult<Vec<Position>>>()?;
    Ok(PositionsPage {
        positions,
        bookmark: next,
    })
}

/// Looks a position up by id alone, scanning the pool's position space.
pub fn get_position_by_id(ledger: &dyn Ledger, dto: &GetPositionByIdDto) -> DexResult<Position> {
    let pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    let prefix = format!(
        "{}{}{}{}",
        keys::object_type::POSITION,
        KEY_SEPARATOR,
        pool.pool_hash(),
        KEY_SEPARATOR
    );
    let mut bookmark: Option<String> = None;
    loop {
        let (page, next) = ledger.get_range(&prefix, bookmark.as_deref(), 256)?;
        for (_, bytes) in &page {
            let position: Position = serde_json::from_slice(bytes)?;
            if position.position_id == dto.position_id {
                return Ok(position);
            }
        }
        match next {
            Some(mark) => bookmark = Some(mark),
            None => {
                return Err(DexError::NotFound(format!(
                    "position {} does not exist",
                    dto.position_id
                )))
            }
        }
    }
}

/// One user position reference in the paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPositionRef {
    pub pool_hash: String,
    pub tick_range: String,
    pub position_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPositionsPage {
    pub positions: Vec<UserPositionRef>,
    /// `chain@local` cursor: the ledger bookmark of the index entry being
    /// consumed, and the offset already emitted within it.
    pub bookmark: Option<String>,
}

fn split_cursor(bookmark: Option<&str>) -> DexResult<(Option<String>, usize)> {
    match bookmark {
        None => Ok((None, 0)),
        Some(raw) => {
            let (chain, local) = raw.rsplit_once('@').ok_or_else(|| {
                DexError::ValidationFailed(format!("malformed bookmark {raw:?}"))
            })?;
            let offset = local.parse::<usize>().map_err(|_| {
                DexError::ValidationFailed(format!("malformed bookmark {raw:?}"))
            })?;
            let chain = if chain.is_empty() {
                None
            } else {
                Some(chain.to_string())
            };
            Ok((chain, offset))
        }
    }
}

/// Pages through a user's positions across all pools.
///
/// The cursor is explicit: the chain part addresses the index entry, the
/// local part the offset inside its flattened range list, so a page boundary
/// in the middle of an entry resumes exactly where it stopped.
pub fn get_user_positions(
    ledger: &dyn Ledger,
    dto: &GetUserPositionsDto,
) -> DexResult<UserPositionsPage> {
    dto.validate()?;
    let limit = dto.limit.min(MAX_USER_POSITIONS_PAGE);
    let (mut chain_mark, mut local_offset) = split_cursor(dto.bookmark.as_deref())?;
    let prefix = format!(
        "{}{}{}{}",
        keys::object_type::USER_POSITION_INDEX,
        KEY_SEPARATOR,
        dto.user,
        KEY_SEPARATOR
    );

    let mut out = Vec::new();
    loop {
        // One index entry per page step: entries are keyed per pool.
        let (page, next) = ledger.get_range(&prefix, chain_mark.as_deref(), 1)?;
        let Some((entry_key, bytes)) = page.into_iter().next() else {
            return Ok(UserPositionsPage {
                positions: out,
                bookmark: None,
            });
        };
        let index: UserPositionIndex = serde_json::from_slice(&bytes)?;
        let flat: Vec<UserPositionRef> = index
            .ranges
            .iter()
            .flat_map(|(range, ids)| {
                let pool_hash = index.pool_hash.clone();
                ids.iter().map(move |id| UserPositionRef {
                    pool_hash: pool_hash.clone(),
                    tick_range: range.clone(),
                    position_id: id.clone(),
                })
            })
            .collect();

        for (offset, item) in flat.iter().enumerate().skip(local_offset) {
            if out.len() == limit {
                return Ok(UserPositionsPage {
                    positions: out,
                    bookmark: Some(format!(
                        "{}@{}",
                        chain_mark.as_deref().unwrap_or(""),
                        offset
                    )),
                });
            }
            out.push(item.clone());
        }

        if next.is_none() {
            // The consumed entry was the last one under the prefix.
            return Ok(UserPositionsPage {
                positions: out,
                bookmark: None,
            });
        }
        local_offset = 0;
        chain_mark = Some(entry_key);
    }
}

/// Amounts and liquidity a single-sided deposit would produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityEstimation {
    pub liquidity: UDecimal,
    pub amount0: UDecimal,
    pub amount1: UDecimal,
}

/// Projects what providing `amount` of one token on a range is worth,
/// without touching any state.
pub fn get_add_liquidity_estimation(
    ledger: &dyn Ledger,
    dto: &GetAddLiquidityEstimationDto,
) -> DexResult<LiquidityEstimation> {
    dto.validate()?;
    let pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    let tick_current = pool.current_tick();
    let sqrt_lower = tick_math::tick_to_sqrt_price(dto.tick_lower)?;
    let sqrt_upper = tick_math::tick_to_sqrt_price(dto.tick_upper)?;

    // The single-token amount buys liquidity over the part of the range on
    // its side of the current price.
    let anchor = pool.sqrt_price.clone().max(sqrt_lower.clone()).min(sqrt_upper.clone());
    let liquidity = if dto.is_token0 {
        get_liquidity_for_amount0(&anchor, &sqrt_upper, &dto.amount)?
    } else {
        get_liquidity_for_amount1(&sqrt_lower, &anchor, &dto.amount)?
    };

    let (amount0, amount1) = if tick_current < dto.tick_lower {
        (
            get_amount0_delta(&sqrt_lower, &sqrt_upper, &liquidity, true)?,
            UDecimal::zero(),
        )
    } else if tick_current < dto.tick_upper {
        (
            get_amount0_delta(&pool.sqrt_price, &sqrt_upper, &liquidity, true)?,
            get_amount1_delta(&sqrt_lower, &pool.sqrt_price, &liquidity, true)?,
        )
    } else {
        (
            UDecimal::zero(),
            get_amount1_delta(&sqrt_lower, &sqrt_upper, &liquidity, true)?,
        )
    };

    Ok(LiquidityEstimation {
        liquidity,
        amount0,
        amount1,
    })
}

/// Projects what burning `amount` of liquidity would return, without
/// touching any state.
pub fn get_remove_liquidity_estimation(
    ledger: &dyn Ledger,
    caller: &str,
    dto: &GetRemoveLiquidityEstimationDto,
) -> DexResult<LiquidityEstimation> {
    dto.validate()?;
    let pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
    let pool_hash = pool.pool_hash();
    let position = resolve_position(
        ledger,
        &pool_hash,
        caller,
        dto.tick_lower,
        dto.tick_upper,
        dto.position_id.as_deref(),
    )?;
    let amount = dto.amount.clone().min(position.liquidity.clone());

    let tick_current = pool.current_tick();
    let sqrt_lower = tick_math::tick_to_sqrt_price(dto.tick_lower)?;
    let sqrt_upper = tick_math::tick_to_sqrt_price(dto.tick_upper)?;
    let (amount0, amount1) = if tick_current < dto.tick_lower {
        (
            get_amount0_delta(&sqrt_lower, &sqrt_upper, &amount, false)?,
            UDecimal::zero(),
        )
    } else if tick_current < dto.tick_upper {
        (
            get_amount0_delta(&pool.sqrt_price, &sqrt_upper, &amount, false)?,
            get_amount1_delta(&sqrt_lower, &pool.sqrt_price, &amount, false)?,
        )
    } else {
        (
            UDecimal::zero(),
            get_amount1_delta(&sqrt_lower, &sqrt_upper, &amount, false)?,
        )
    };

    Ok(LiquidityEstimation {
        liquidity: amount,
        amount0,
        amount1,
    })
}
