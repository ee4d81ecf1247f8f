//! Commit–reveal limit orders: place, fill, cancel, and the global filler
//! configuration.

use amm_math::{Rounding, UDecimal};
use log::{debug, info};

use crate::dto::{
    CancelLimitOrderDto, FillLimitOrderDto, PlaceLimitOrderDto, SetGlobalLimitOrderConfigDto,
    SwapDto,
};
use crate::errors::{DexError, DexResult};
use crate::keys;
use crate::ledger::{get_object, put_object, Ledger, TokenLedger};
use crate::limit_order::{decimal_sqrt, GlobalLimitOrderConfig, LimitOrderCommitment};
use crate::operations::swap_op;
use crate::pool::{TokenKey, FEE_TIER_HIGH, FEE_TIER_LOW, FEE_TIER_MEDIUM};

/// Replaces the set of wallets allowed to fill revealed orders. Bootstraps on
/// first call; afterwards only a current admin may change it.
pub fn set_global_limit_order_config(
    ledger: &mut dyn Ledger,
    caller: &str,
    dto: &SetGlobalLimitOrderConfigDto,
) -> DexResult<GlobalLimitOrderConfig> {
    dto.validate()?;
    let key = keys::global_limit_order_config_key();
    if let Some(existing) = get_object::<GlobalLimitOrderConfig>(ledger, &key)? {
        if !existing.is_admin(caller) {
            return Err(DexError::Unauthorized(format!(
                "{caller} is not a limit-order admin"
            )));
        }
    }
    let config = GlobalLimitOrderConfig {
        limit_order_admin_wallets: dto.limit_order_admin_wallets.clone(),
    };
    put_object(ledger, &key, &config)?;
    info!(
        "limit-order admin wallets set to {:?}",
        config.limit_order_admin_wallets
    );
    Ok(config)
}

/// Stores a hash commitment for a future order. The order's terms stay
/// hidden until reveal; only the expiry is public.
pub fn place_limit_order(
    ledger: &mut dyn Ledger,
    _caller: &str,
    now: u64,
    dto: &PlaceLimitOrderDto,
) -> DexResult<LimitOrderCommitment> {
    dto.validate(now)?;
    let key = keys::limit_order_commitment_key(&dto.hash);
    if ledger.get(&key)?.is_some() {
        return Err(DexError::Conflict(format!(
            "commitment {} already placed",
            dto.hash
        )));
    }
    let commitment = LimitOrderCommitment {
        hash: dto.hash.clone(),
        expires: dto.expires,
    };
    put_object(ledger, &key, &commitment)?;
    Ok(commitment)
}

fn load_admin_config(ledger: &dyn Ledger) -> DexResult<GlobalLimitOrderConfig> {
    get_object(ledger, &keys::global_limit_order_config_key())?.ok_or_else(|| {
        DexError::NotFound("global limit-order configuration is not set".into())
    })
}

/// Finds the pool for a revealed token pair, trying fee tiers from cheapest
/// to dearest; the reveal does not carry a tier.
fn find_pool_fee(
    ledger: &dyn Ledger,
    token0: &TokenKey,
    token1: &TokenKey,
) -> DexResult<u32> {
    for fee in [FEE_TIER_LOW, FEE_TIER_MEDIUM, FEE_TIER_HIGH] {
        if ledger.get(&keys::pool_key(token0, token1, fee))?.is_some() {
            return Ok(fee);
        }
    }
    Err(DexError::NotFound(format!(
        "no pool exists for {token0}/{token1}"
    )))
}

/// Reveals and settles a placed order.
///
/// The filler must be a configured admin wallet. The reveal is hashed with
/// the exact commitment encoding; a missing commitment (wrong fields, double
/// fill) is `NotFound`. The owner's sell amount funds an exact-in swap whose
/// price bound derives from the committed ratio, and the output settles back
/// to the owner. The commitment burns on success.
pub fn fill_limit_order(
    ledger: &mut dyn Ledger,
    tokens: &mut dyn TokenLedger,
    caller: &str,
    now: u64,
    dto: &FillLimitOrderDto,
) -> DexResult<swap_op::SwapResult> {
    dto.validate()?;
    let config = load_admin_config(ledger)?;
    if !config.is_admin(caller) {
        return Err(DexError::Unauthorized(format!(
            "{caller} is not a limit-order admin"
        )));
    }

    let reveal = &dto.reveal;
    let hash = reveal.commitment_hash();
    let key = keys::limit_order_commitment_key(&hash);
    let commitment: LimitOrderCommitment = get_object(ledger, &key)?
        .ok_or_else(|| DexError::NotFound(format!("no commitment {hash}")))?;
    if commitment.expires != 0 && commitment.expires < now {
        return Err(DexError::ValidationFailed(format!(
            "commitment expired at {}",
            commitment.expires
        )));
    }

    // Canonical pool ordering decides the swap direction.
    let sell = TokenKey(reveal.selling_token.clone());
    let buy = TokenKey(reveal.buying_token.clone());
    let (token0, token1) = if sell < buy {
        (sell.clone(), buy.clone())
    } else {
        (buy.clone(), sell.clone())
    };
    let zero_for_one = sell == token0;
    let fee = find_pool_fee(ledger, &token0, &token1)?;

    // The committed ratio is buy-per-sell; expressed as a token1/token0
    // price it bounds how far the swap may move.
    let price_bound = if zero_for_one {
        reveal.buying_to_selling_ratio.clone()
    } else {
        UDecimal::one().div(&reveal.buying_to_selling_ratio, Rounding::HalfUp)?
    };
    let sqrt_price_limit = decimal_sqrt(&price_bound)?;

    let swap_dto = SwapDto {
        token0,
        token1,
        fee,
        amount: reveal.selling_amount.to_signed(),
        zero_for_one,
        sqrt_price_limit,
        amount_in_maximum: None,
        amount_out_minimum: Some(reveal.buying_minimum.clone()),
        recipient: Some(reveal.owner.clone()),
        unique_key: dto.unique_key.clone(),
    };
    // The owner is the payer of record; the host's allowance system has
    // already cleared the filler to move their funds.
    let result = swap_op::swap(ledger, tokens, &reveal.owner, &swap_dto)?;

    ledger.delete(&key)?;
    debug!("filled limit order {hash} for {}", reveal.owner);
    Ok(result)
}

/// Deletes a commitment. The order's owner may always cancel; admin wallets
/// may cancel on anyone's behalf.
pub fn cancel_limit_order(
    ledger: &mut dyn Ledger,
    caller: &str,
    dto: &CancelLimitOrderDto,
) -> DexResult<()> {
    dto.validate()?;
    let hash = dto.reveal.commitment_hash();
    let key = keys::limit_order_commitment_key(&hash);
    if ledger.get(&key)?.is_none() {
        return Err(DexError::NotFound(format!("no commitment {hash}")));
    }
    if caller != dto.reveal.owner {
        let config = load_admin_config(ledger)?;
        if !config.is_admin(caller) {
            return Err(DexError::Unauthorized(format!(
                "{caller} may not cancel an order owned by {}",
                dto.reveal.owner
            )));
        }
    }
    ledger.delete(&key)?;
    Ok(())
}
