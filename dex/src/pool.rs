//! Pool state and fee-tier configuration.

use std::collections::BTreeMap;
use std::fmt;

use amm_math::tick_math::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use amm_math::{tick_math, UDecimal};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::errors::{DexError, DexResult};
use crate::keys;

/// Token class identity; compared lexicographically for pool ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenKey(pub String);

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supported fee tiers, in hundredths of a basis point.
pub const FEE_TIER_LOW: u32 = 500; // 0.05%
pub const FEE_TIER_MEDIUM: u32 = 3000; // 0.30%
pub const FEE_TIER_HIGH: u32 = 10_000; // 1.00%

/// Basis-point denominator for the protocol fee split.
pub const PROTOCOL_FEE_DENOMINATOR: u16 = 10_000;

/// Tick spacing tied to a fee tier; `None` for unsupported tiers.
pub fn tick_spacing_for_fee(fee: u32) -> Option<i32> {
    match fee {
        FEE_TIER_LOW => Some(10),
        FEE_TIER_MEDIUM => Some(60),
        FEE_TIER_HIGH => Some(200),
        _ => None,
    }
}

/// A pool's whole persisted state.
///
/// The bitmap maps a word index to a 256-bit word whose set bits mark
/// initialized ticks at `(word * 256 + bit) * tick_spacing`; it must agree
/// with stored `TickData` at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub tick_spacing: i32,
    pub sqrt_price: UDecimal,
    /// Current tick. Tracked alongside the price because a price exactly on
    /// a tick boundary is ambiguous about whether that tick has been
    /// crossed; the stored tick disambiguates (below the boundary after a
    /// downward cross).
    pub tick: i32,
    pub liquidity: UDecimal,
    pub fee_growth_global0: UDecimal,
    pub fee_growth_global1: UDecimal,
    pub protocol_fees_token0: UDecimal,
    pub protocol_fees_token1: UDecimal,
    /// Share of swap fees diverted to the protocol, in basis points.
    pub protocol_fee_bps: u16,
    pub bitmap: BTreeMap<i16, U256>,
    pub is_private: bool,
    pub whitelist: Vec<String>,
}

impl Pool {
    /// Creates a pool at an initial price. Token ordering, fee tier and
    /// price bounds are enforced here; existence checks are the caller's.
    pub fn new(
        token0: TokenKey,
        token1: TokenKey,
        fee: u32,
        initial_sqrt_price: UDecimal,
        protocol_fee_bps: u16,
    ) -> DexResult<Self> {
        if token0 == token1 {
            return Err(DexError::Conflict(format!(
                "cannot create a pool of {token0} against itself"
            )));
        }
        if token0 > token1 {
            return Err(DexError::ValidationFailed(format!(
                "token0 must order before token1, got {token0} / {token1}"
            )));
        }
        let tick_spacing = tick_spacing_for_fee(fee).ok_or_else(|| {
            DexError::ValidationFailed(format!("unsupported fee tier {fee}"))
        })?;
        if initial_sqrt_price < *MIN_SQRT_RATIO || initial_sqrt_price > *MAX_SQRT_RATIO {
            return Err(DexError::ValidationFailed(format!(
                "initial sqrt price {initial_sqrt_price} outside admissible range"
            )));
        }
        if protocol_fee_bps > PROTOCOL_FEE_DENOMINATOR {
            return Err(DexError::ValidationFailed(format!(
                "protocol fee {protocol_fee_bps} bps exceeds 100%"
            )));
        }

        let tick = tick_math::sqrt_price_to_tick(&initial_sqrt_price)?;
        Ok(Pool {
            token0,
            token1,
            fee,
            tick_spacing,
            sqrt_price: initial_sqrt_price,
            tick,
            liquidity: UDecimal::zero(),
            fee_growth_global0: UDecimal::zero(),
            fee_growth_global1: UDecimal::zero(),
            protocol_fees_token0: UDecimal::zero(),
            protocol_fees_token1: UDecimal::zero(),
            protocol_fee_bps,
            bitmap: BTreeMap::new(),
            is_private: false,
            whitelist: Vec::new(),
        })
    }

    pub fn pool_hash(&self) -> String {
        keys::pool_hash(&self.token0, &self.token1, self.fee)
    }

    pub fn pool_alias(&self) -> String {
        keys::pool_alias(&self.pool_hash())
    }

    pub fn current_tick(&self) -> i32 {
        self.tick
    }

    /// Whether `user` may provide liquidity to this pool.
    pub fn can_provide_liquidity(&self, user: &str) -> bool {
        !self.is_private || self.whitelist.iter().any(|w| w == user)
    }
}

/// Global protocol-fee configuration singleton.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexFeeConfig {
    /// Wallets allowed to change the protocol fee and collect it.
    pub authorities: Vec<String>,
    /// Fee share applied to pools created after this was set.
    pub protocol_fee_bps: u16,
}

impl DexFeeConfig {
    pub fn is_authority(&self, user: &str) -> bool {
        self.authorities.iter().any(|a| a == user)
    }
}
