//! Wire DTOs and their validation.
//!
//! DTOs are plain serde records; every submit-style DTO carries a
//! `unique_key` the host uses for idempotent retries, and is validated by an
//! explicit `validate()` before the operation runs. Signature recovery and
//! caller identity are the host's job; operations receive the caller as an
//! argument.

use amm_math::{SDecimal, UDecimal, MAX_TICK, MIN_TICK};
use serde::{Deserialize, Serialize};

use crate::errors::{DexError, DexResult};
use crate::limit_order::{validate_commitment_hash, LimitOrderReveal};
use crate::pool::{tick_spacing_for_fee, TokenKey};
use crate::quote::CompositePool;

fn require_unique_key(unique_key: &str) -> DexResult<()> {
    if unique_key.is_empty() {
        return Err(DexError::ValidationFailed("uniqueKey must be set".into()));
    }
    Ok(())
}

fn require_fee_tier(fee: u32) -> DexResult<i32> {
    tick_spacing_for_fee(fee)
        .ok_or_else(|| DexError::ValidationFailed(format!("unsupported fee tier {fee}")))
}

fn require_tick_range(tick_lower: i32, tick_upper: i32, spacing: i32) -> DexResult<()> {
    if tick_lower >= tick_upper {
        return Err(DexError::ValidationFailed(format!(
            "tickLower {tick_lower} must be below tickUpper {tick_upper}"
        )));
    }
    if tick_lower < MIN_TICK || tick_upper > MAX_TICK {
        return Err(DexError::ValidationFailed(format!(
            "tick range [{tick_lower}, {tick_upper}] outside [{MIN_TICK}, {MAX_TICK}]"
        )));
    }
    if tick_lower % spacing != 0 || tick_upper % spacing != 0 {
        return Err(DexError::ValidationFailed(format!(
            "ticks must be multiples of spacing {spacing}"
        )));
    }
    Ok(())
}

fn require_positive(name: &str, amount: &UDecimal) -> DexResult<()> {
    if amount.is_zero() {
        return Err(DexError::ValidationFailed(format!(
            "{name} must be positive"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub initial_sqrt_price: UDecimal,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub whitelist: Vec<String>,
    pub unique_key: String,
}

impl CreatePoolDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        require_fee_tier(self.fee)?;
        require_positive("initialSqrtPrice", &self.initial_sqrt_price)?;
        if self.token0 >= self.token1 {
            return Err(DexError::ValidationFailed(format!(
                "token0 {} must order strictly before token1 {}",
                self.token0, self.token1
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLiquidityDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: UDecimal,
    pub amount1_desired: UDecimal,
    pub amount0_min: UDecimal,
    pub amount1_min: UDecimal,
    #[serde(default)]
    pub position_id: Option<String>,
    pub unique_key: String,
}

impl AddLiquidityDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        let spacing = require_fee_tier(self.fee)?;
        require_tick_range(self.tick_lower, self.tick_upper, spacing)?;
        if self.amount0_desired.is_zero() && self.amount1_desired.is_zero() {
            return Err(DexError::ValidationFailed(
                "at least one desired amount must be positive".into(),
            ));
        }
        if self.amount0_min > self.amount0_desired || self.amount1_min > self.amount1_desired {
            return Err(DexError::ValidationFailed(
                "minimum amounts cannot exceed desired amounts".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLiquidityDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Liquidity to burn.
    pub amount: UDecimal,
    #[serde(default)]
    pub position_id: Option<String>,
    pub unique_key: String,
}

impl RemoveLiquidityDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        let spacing = require_fee_tier(self.fee)?;
        require_tick_range(self.tick_lower, self.tick_upper, spacing)?;
        require_positive("amount", &self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectPositionFeesDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_requested: UDecimal,
    pub amount1_requested: UDecimal,
    #[serde(default)]
    pub position_id: Option<String>,
    pub unique_key: String,
}

impl CollectPositionFeesDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        let spacing = require_fee_tier(self.fee)?;
        require_tick_range(self.tick_lower, self.tick_upper, spacing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    /// Positive for exact input, negative for exact output.
    pub amount: SDecimal,
    pub zero_for_one: bool,
    pub sqrt_price_limit: UDecimal,
    #[serde(default)]
    pub amount_in_maximum: Option<UDecimal>,
    #[serde(default)]
    pub amount_out_minimum: Option<UDecimal>,
    #[serde(default)]
    pub recipient: Option<String>,
    pub unique_key: String,
}

impl SwapDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        require_fee_tier(self.fee)?;
        if self.amount.is_zero() {
            return Err(DexError::ValidationFailed("amount must be non-zero".into()));
        }
        require_positive("sqrtPriceLimit", &self.sqrt_price_limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteExactAmountDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub amount: SDecimal,
    pub zero_for_one: bool,
    #[serde(default)]
    pub sqrt_price_limit: Option<UDecimal>,
    /// Optional detached snapshot; when absent the quote loads live state.
    #[serde(default)]
    pub composite_pool: Option<CompositePool>,
}

impl QuoteExactAmountDto {
    pub fn validate(&self) -> DexResult<()> {
        require_fee_tier(self.fee)?;
        if self.amount.is_zero() {
            return Err(DexError::ValidationFailed("amount must be non-zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPoolDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
}

impl GetPoolDto {
    pub fn validate(&self) -> DexResult<()> {
        require_fee_tier(self.fee)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTickDataDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub tick: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPositionByIdDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub position_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserPositionsDto {
    pub user: String,
    #[serde(default)]
    pub bookmark: Option<String>,
    pub limit: usize,
}

/// Hard page cap for user-position queries.
pub const MAX_USER_POSITIONS_PAGE: usize = 10;

impl GetUserPositionsDto {
    pub fn validate(&self) -> DexResult<()> {
        if self.limit == 0 || self.limit > MAX_USER_POSITIONS_PAGE {
            return Err(DexError::ValidationFailed(format!(
                "limit must be in 1..={MAX_USER_POSITIONS_PAGE}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAddLiquidityEstimationDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Amount of the single token being provided.
    pub amount: UDecimal,
    /// Which token `amount` denominates.
    pub is_token0: bool,
}

impl GetAddLiquidityEstimationDto {
    pub fn validate(&self) -> DexResult<()> {
        let spacing = require_fee_tier(self.fee)?;
        require_tick_range(self.tick_lower, self.tick_upper, spacing)?;
        require_positive("amount", &self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRemoveLiquidityEstimationDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Liquidity to price out.
    pub amount: UDecimal,
    #[serde(default)]
    pub position_id: Option<String>,
}

impl GetRemoveLiquidityEstimationDto {
    pub fn validate(&self) -> DexResult<()> {
        let spacing = require_fee_tier(self.fee)?;
        require_tick_range(self.tick_lower, self.tick_upper, spacing)?;
        require_positive("amount", &self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceLimitOrderDto {
    pub hash: String,
    /// Unix seconds; zero means no expiry.
    pub expires: u64,
    pub unique_key: String,
}

impl PlaceLimitOrderDto {
    pub fn validate(&self, now: u64) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        validate_commitment_hash(&self.hash)?;
        if self.expires != 0 && self.expires < now {
            return Err(DexError::ValidationFailed(format!(
                "expiry {} is already in the past",
                self.expires
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillLimitOrderDto {
    #[serde(flatten)]
    pub reveal: LimitOrderReveal,
    pub unique_key: String,
}

impl FillLimitOrderDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        require_positive("sellingAmount", &self.reveal.selling_amount)?;
        require_positive("buyingToSellingRatio", &self.reveal.buying_to_selling_ratio)?;
        if self.reveal.selling_token == self.reveal.buying_token {
            return Err(DexError::ValidationFailed(
                "selling and buying token must differ".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelLimitOrderDto {
    #[serde(flatten)]
    pub reveal: LimitOrderReveal,
    pub unique_key: String,
}

impl CancelLimitOrderDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetGlobalLimitOrderConfigDto {
    pub limit_order_admin_wallets: Vec<String>,
    pub unique_key: String,
}

impl SetGlobalLimitOrderConfigDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProtocolFeeDto {
    /// Fraction of swap fees diverted to the protocol, in `[0, 1]` with at
    /// most four decimal places.
    pub protocol_fee: UDecimal,
    pub unique_key: String,
}

impl SetProtocolFeeDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        if self.protocol_fee > UDecimal::one() {
            return Err(DexError::ValidationFailed(
                "protocol fee must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Exact conversion to basis points; rejects more than 4 decimal places.
    pub fn protocol_fee_bps(&self) -> DexResult<u16> {
        let bps = self
            .protocol_fee
            .mul(&UDecimal::from_u64(10_000))
            .to_string();
        bps.parse::<u16>().map_err(|_| {
            DexError::ValidationFailed(format!(
                "protocol fee {} is finer than basis points",
                self.protocol_fee
            ))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureDexFeeAddressDto {
    pub authorities: Vec<String>,
    pub unique_key: String,
}

impl ConfigureDexFeeAddressDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        if self.authorities.is_empty() {
            return Err(DexError::ValidationFailed(
                "authority list cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectProtocolFeesDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub amount0_requested: UDecimal,
    pub amount1_requested: UDecimal,
    pub recipient: String,
    pub unique_key: String,
}

impl CollectProtocolFeesDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        require_fee_tier(self.fee)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBitmapDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub unique_key: String,
}

impl UpdateBitmapDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        require_fee_tier(self.fee)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferUnclaimedFundsDto {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub recipient: String,
    pub unique_key: String,
}

impl TransferUnclaimedFundsDto {
    pub fn validate(&self) -> DexResult<()> {
        require_unique_key(&self.unique_key)?;
        require_fee_tier(self.fee)?;
        Ok(())
    }
}
