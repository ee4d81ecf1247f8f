//! Per-tick state and the fee-growth bookkeeping that hangs off it.
//!
//! A tick exists only while positions reference it (`initialized` iff
//! `liquidity_gross > 0`). `fee_growth_outside` values are checkpoints in the
//! fee-growth coordinate system: they flip meaning every time the price
//! crosses the tick, which is what lets `fee_growth_inside` be derived from
//! two ticks and the globals alone. Subtractions here are genuine signed
//! arithmetic; outside/inside values may be transiently negative and cancel
//! exactly once the price re-crosses the tick.

use amm_math::liquidity_math::add_liquidity_delta;
use amm_math::{SDecimal, UDecimal};
use serde::{Deserialize, Serialize};

use crate::errors::DexResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickData {
    pub pool_hash: String,
    pub tick: i32,
    /// Total liquidity referencing this tick from either side.
    pub liquidity_gross: UDecimal,
    /// Net liquidity change when the price crosses this tick upward.
    pub liquidity_net: SDecimal,
    pub fee_growth_outside0: SDecimal,
    pub fee_growth_outside1: SDecimal,
    pub initialized: bool,
}

impl TickData {
    pub fn empty(pool_hash: &str, tick: i32) -> Self {
        TickData {
            pool_hash: pool_hash.to_string(),
            tick,
            liquidity_gross: UDecimal::zero(),
            liquidity_net: SDecimal::zero(),
            fee_growth_outside0: SDecimal::zero(),
            fee_growth_outside1: SDecimal::zero(),
            initialized: false,
        }
    }

    /// Applies a liquidity change to this tick.
    ///
    /// Returns `true` when the tick flipped between initialized and
    /// uninitialized, in which case the caller must flip the bitmap bit (and
    /// delete the tick when it emptied). On first initialization the outside
    /// checkpoints adopt the current globals iff the tick is at or below the
    /// current price, so that "outside" starts meaning "below".
    pub fn update(
        &mut self,
        tick_current: i32,
        liquidity_delta: &SDecimal,
        fee_growth_global0: &UDecimal,
        fee_growth_global1: &UDecimal,
        upper: bool,
    ) -> DexResult<bool> {
        let was_initialized = self.initialized;

        self.liquidity_gross = add_liquidity_delta(&self.liquidity_gross, liquidity_delta)?;
        self.liquidity_net = if upper {
            self.liquidity_net.sub(liquidity_delta)
        } else {
            self.liquidity_net.add(liquidity_delta)
        };

        let now_initialized = !self.liquidity_gross.is_zero();
        if !was_initialized && now_initialized && self.tick <= tick_current {
            self.fee_growth_outside0 = fee_growth_global0.to_signed();
            self.fee_growth_outside1 = fee_growth_global1.to_signed();
        }
        self.initialized = now_initialized;

        Ok(was_initialized != now_initialized)
    }

    /// Crossing flip: `outside <- global - outside` for both tokens.
    /// Returns the net liquidity change seen when crossing upward.
    pub fn cross(
        &mut self,
        fee_growth_global0: &UDecimal,
        fee_growth_global1: &UDecimal,
    ) -> SDecimal {
        self.fee_growth_outside0 = fee_growth_global0.to_signed().sub(&self.fee_growth_outside0);
        self.fee_growth_outside1 = fee_growth_global1.to_signed().sub(&self.fee_growth_outside1);
        self.liquidity_net.clone()
    }
}

/// Fee growth accumulated strictly inside `[tick_lower, tick_upper)` since
/// pool creation, per token.
pub fn fee_growth_inside(
    lower: &TickData,
    upper: &TickData,
    tick_current: i32,
    fee_growth_global0: &UDecimal,
    fee_growth_global1: &UDecimal,
) -> (SDecimal, SDecimal) {
    let global0 = fee_growth_global0.to_signed();
    let global1 = fee_growth_global1.to_signed();

    let (below0, below1) = if tick_current >= lower.tick {
        (
            lower.fee_growth_outside0.clone(),
            lower.fee_growth_outside1.clone(),
        )
    } else {
        (
            global0.sub(&lower.fee_growth_outside0),
            global1.sub(&lower.fee_growth_outside1),
        )
    };

    let (above0, above1) = if tick_current < upper.tick {
        (
            upper.fee_growth_outside0.clone(),
            upper.fee_growth_outside1.clone(),
        )
    } else {
        (
            global0.sub(&upper.fee_growth_outside0),
            global1.sub(&upper.fee_growth_outside1),
        )
    };

    (
        global0.sub(&below0).sub(&above0),
        global1.sub(&below1).sub(&above1),
    )
}
