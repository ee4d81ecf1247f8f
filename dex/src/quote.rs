//! Read-only swap simulation over an in-memory pool snapshot.

use std::collections::BTreeMap;

use amm_math::{SDecimal, UDecimal};
use serde::{Deserialize, Serialize};

use crate::errors::DexResult;
use crate::pool::Pool;
use crate::swap::{execute_swap, SwapParams, TickDataSource};
use crate::tick::TickData;

/// A detached snapshot of everything a swap touches. Hosts can assemble one
/// from live state or pass a hypothetical pool for what-if quoting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositePool {
    pub pool: Pool,
    /// Initialised ticks by index.
    pub tick_data: BTreeMap<i32, TickData>,
    /// The pool account's current balances, informational for hosts.
    pub token0_balance: UDecimal,
    pub token1_balance: UDecimal,
}

impl TickDataSource for CompositePool {
    fn tick_data(&mut self, _pool_hash: &str, tick: i32) -> DexResult<Option<TickData>> {
        Ok(self.tick_data.get(&tick).cloned())
    }
}

/// Result of a simulated swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub amount0: SDecimal,
    pub amount1: SDecimal,
    pub current_sqrt_price: UDecimal,
    pub new_sqrt_price: UDecimal,
}

/// Simulates a swap against the snapshot; nothing is written anywhere.
pub fn quote_exact_amount(
    snapshot: &CompositePool,
    params: &SwapParams,
) -> DexResult<QuoteResult> {
    let mut working = snapshot.clone();
    let pool = working.pool.clone();
    let outcome = execute_swap(&pool, &mut working, params)?;
    Ok(QuoteResult {
        amount0: outcome.amount0,
        amount1: outcome.amount1,
        current_sqrt_price: snapshot.pool.sqrt_price.clone(),
        new_sqrt_price: outcome.sqrt_price,
    })
}
