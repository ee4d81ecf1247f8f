//! `QuoteExactAmount`: read-only swap simulation.

use std::collections::BTreeMap;

use amm_math::tick_math::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use amm_math::UDecimal;

use crate::dto::QuoteExactAmountDto;
use crate::errors::DexResult;
use crate::keys::{self, KEY_SEPARATOR};
use crate::ledger::Ledger;
use crate::quote::{quote_exact_amount, CompositePool, QuoteResult};
use crate::swap::SwapParams;
use crate::tick::TickData;

use super::load_pool;

/// Loads every initialized tick of a pool into a snapshot map.
pub(crate) fn load_all_ticks(
    ledger: &dyn Ledger,
    pool_hash: &str,
) -> DexResult<BTreeMap<i32, TickData>> {
    let prefix = format!(
        "{}{}{}{}",
        keys::object_type::TICK_DATA,
        KEY_SEPARATOR,
        pool_hash,
        KEY_SEPARATOR
    );
    let mut ticks = BTreeMap::new();
    let mut bookmark: Option<String> = None;
    loop {
        let (page, next) = ledger.get_range(&prefix, bookmark.as_deref(), 256)?;
        for (_, bytes) in &page {
            let tick: TickData = serde_json::from_slice(bytes)?;
            ticks.insert(tick.tick, tick);
        }
        match next {
            Some(mark) => bookmark = Some(mark),
            None => break,
        }
    }
    Ok(ticks)
}

/// Simulates a swap over the provided snapshot, or over live state when the
/// DTO carries no `compositePool`. Nothing is written either way.
pub fn quote(ledger: &dyn Ledger, dto: &QuoteExactAmountDto) -> DexResult<QuoteResult> {
    dto.validate()?;

    let snapshot = match &dto.composite_pool {
        Some(snapshot) => snapshot.clone(),
        None => {
            let pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;
            let tick_data = load_all_ticks(ledger, &pool.pool_hash())?;
            CompositePool {
                pool,
                tick_data,
                token0_balance: UDecimal::zero(),
                token1_balance: UDecimal::zero(),
            }
        }
    };

    let sqrt_price_limit = match &dto.sqrt_price_limit {
        Some(limit) => limit.clone(),
        None if dto.zero_for_one => MIN_SQRT_RATIO.clone(),
        None => MAX_SQRT_RATIO.clone(),
    };

    quote_exact_amount(
        &snapshot,
        &SwapParams {
            zero_for_one: dto.zero_for_one,
            amount_specified: dto.amount.clone(),
            sqrt_price_limit,
        },
    )
}
