//! Range-liquidity positions and the per-user index used for pagination.

use amm_math::liquidity_math::add_liquidity_delta;
use amm_math::{SDecimal, UDecimal};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{DexError, DexResult};

/// Threshold below which a position's liquidity and owed amounts count as
/// dust; the single source for every dust comparison in the engine.
pub static POSITION_DUST: Lazy<UDecimal> =
    Lazy::new(|| UDecimal::new("0.00000001").expect("static constant"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub pool_hash: String,
    pub owner: String,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub position_id: String,
    pub liquidity: UDecimal,
    /// Fee-growth-inside checkpoints as of the last `update`.
    pub fee_growth_inside0_last: SDecimal,
    pub fee_growth_inside1_last: SDecimal,
    /// Fees and burned principal awaiting `collect`.
    pub tokens_owed0: UDecimal,
    pub tokens_owed1: UDecimal,
}

impl Position {
    pub fn new(
        pool_hash: &str,
        owner: &str,
        tick_lower: i32,
        tick_upper: i32,
        position_id: &str,
    ) -> Self {
        Position {
            pool_hash: pool_hash.to_string(),
            owner: owner.to_string(),
            tick_lower,
            tick_upper,
            position_id: position_id.to_string(),
            liquidity: UDecimal::zero(),
            fee_growth_inside0_last: SDecimal::zero(),
            fee_growth_inside1_last: SDecimal::zero(),
            tokens_owed0: UDecimal::zero(),
            tokens_owed1: UDecimal::zero(),
        }
    }

    /// Range label used by the user-position index.
    pub fn tick_range(&self) -> String {
        format!("{}:{}", self.tick_lower, self.tick_upper)
    }

    /// Settles fee growth since the last checkpoint into `tokens_owed`,
    /// advances the checkpoints (always, even for a zero delta), then applies
    /// the liquidity change.
    pub fn update(
        &mut self,
        liquidity_delta: &SDecimal,
        fee_growth_inside0: &SDecimal,
        fee_growth_inside1: &SDecimal,
    ) -> DexResult<()> {
        let (accrued0, accrued1) = self.accrued_since_checkpoint(fee_growth_inside0, fee_growth_inside1)?;
        self.tokens_owed0 = self.tokens_owed0.add(&accrued0);
        self.tokens_owed1 = self.tokens_owed1.add(&accrued1);
        self.fee_growth_inside0_last = fee_growth_inside0.clone();
        self.fee_growth_inside1_last = fee_growth_inside1.clone();
        self.liquidity = add_liquidity_delta(&self.liquidity, liquidity_delta)
            .map_err(|_| {
                DexError::Conflict(format!(
                    "position {} cannot burn below zero liquidity",
                    self.position_id
                ))
            })?;
        Ok(())
    }

    /// Projected `tokens_owed` increments if fees were settled right now.
    ///
    /// Strictly read-only: neither the checkpoints nor the owed amounts move.
    /// `collect` performs the real settlement via [`Position::update`].
    pub fn fee_collected_estimation(
        &self,
        fee_growth_inside0: &SDecimal,
        fee_growth_inside1: &SDecimal,
    ) -> DexResult<(UDecimal, UDecimal)> {
        self.accrued_since_checkpoint(fee_growth_inside0, fee_growth_inside1)
    }

    fn accrued_since_checkpoint(
        &self,
        fee_growth_inside0: &SDecimal,
        fee_growth_inside1: &SDecimal,
    ) -> DexResult<(UDecimal, UDecimal)> {
        let liquidity = self.liquidity.to_signed();
        let accrued0 = fee_growth_inside0
            .sub(&self.fee_growth_inside0_last)
            .mul(&liquidity);
        let accrued1 = fee_growth_inside1
            .sub(&self.fee_growth_inside1_last)
            .mul(&liquidity);
        let accrued0 = accrued0.into_unsigned().map_err(|_| {
            DexError::Conflict(format!(
                "fee growth regressed for position {}",
                self.position_id
            ))
        })?;
        let accrued1 = accrued1.into_unsigned().map_err(|_| {
            DexError::Conflict(format!(
                "fee growth regressed for position {}",
                self.position_id
            ))
        })?;
        Ok((accrued0, accrued1))
    }

    /// True once liquidity and both owed amounts have rounded below the dust
    /// threshold; such positions are deleted together with their index entry.
    pub fn is_dust(&self) -> bool {
        self.liquidity < *POSITION_DUST
            && self.tokens_owed0.f18() < *POSITION_DUST
            && self.tokens_owed1.f18() < *POSITION_DUST
    }
}

/// Per-`(user, pool)` index of position ids grouped by tick range, backing
/// `GetUserPositions` pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPositionIndex {
    pub user: String,
    pub pool_hash: String,
    pub ranges: BTreeMap<String, Vec<String>>,
}

impl UserPositionIndex {
    pub fn new(user: &str, pool_hash: &str) -> Self {
        UserPositionIndex {
            user: user.to_string(),
            pool_hash: pool_hash.to_string(),
            ranges: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, tick_range: &str, position_id: &str) {
        let ids = self.ranges.entry(tick_range.to_string()).or_default();
        if !ids.iter().any(|id| id == position_id) {
            ids.push(position_id.to_string());
        }
    }

    pub fn remove(&mut self, tick_range: &str, position_id: &str) {
        if let Some(ids) = self.ranges.get_mut(tick_range) {
            ids.retain(|id| id != position_id);
            if ids.is_empty() {
                self.ranges.remove(tick_range);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
