//! Pool creation.

use log::info;

use crate::dto::CreatePoolDto;
use crate::errors::{DexError, DexResult};
use crate::keys;
use crate::ledger::{get_object, Ledger};
use crate::pool::{DexFeeConfig, Pool};

use super::save_pool;

/// Creates a pool for `(token0, token1, fee)` at the given initial price.
///
/// The protocol-fee share is snapshotted from the global fee config at
/// creation time. Recreating an existing pool is a conflict.
pub fn create_pool(ledger: &mut dyn Ledger, _caller: &str, dto: &CreatePoolDto) -> DexResult<Pool> {
    dto.validate()?;

    let key = keys::pool_key(&dto.token0, &dto.token1, dto.fee);
    if ledger.get(&key)?.is_some() {
        return Err(DexError::Conflict(format!(
            "pool {}/{}/{} already exists",
            dto.token0, dto.token1, dto.fee
        )));
    }

    let fee_config: Option<DexFeeConfig> = get_object(ledger, &keys::dex_fee_config_key())?;
    let protocol_fee_bps = fee_config.map(|c| c.protocol_fee_bps).unwrap_or(0);

    let mut pool = Pool::new(
        dto.token0.clone(),
        dto.token1.clone(),
        dto.fee,
        dto.initial_sqrt_price.clone(),
        protocol_fee_bps,
    )?;
    pool.is_private = dto.is_private;
    pool.whitelist = dto.whitelist.clone();

    save_pool(ledger, &pool)?;
    info!(
        "created pool {}/{}/{} at sqrt price {}",
        pool.token0, pool.token1, pool.fee, pool.sqrt_price
    );
    Ok(pool)
}
