//! Protocol-fee administration: the authority list and the fee rate.

use log::info;

use crate::dto::{ConfigureDexFeeAddressDto, SetProtocolFeeDto};
use crate::errors::{DexError, DexResult};
use crate::keys;
use crate::ledger::{get_object, put_object, require_object, Ledger};
use crate::pool::DexFeeConfig;

/// Installs or replaces the fee-authority list.
///
/// The first configuration bootstraps with no authority check (the host gates
/// who may submit it organisationally); afterwards only a listed authority
/// can change the list.
pub fn configure_dex_fee_address(
    ledger: &mut dyn Ledger,
    caller: &str,
    dto: &ConfigureDexFeeAddressDto,
) -> DexResult<DexFeeConfig> {
    dto.validate()?;
    let key = keys::dex_fee_config_key();
    let existing: Option<DexFeeConfig> = get_object(ledger, &key)?;
    if let Some(config) = &existing {
        if !config.is_authority(caller) {
            return Err(DexError::Unauthorized(format!(
                "{caller} is not a fee authority"
            )));
        }
    }
    let config = DexFeeConfig {
        authorities: dto.authorities.clone(),
        protocol_fee_bps: existing.map(|c| c.protocol_fee_bps).unwrap_or(0),
    };
    put_object(ledger, &key, &config)?;
    info!("fee authorities set to {:?}", config.authorities);
    Ok(config)
}

/// Sets the protocol's share of swap fees. Applies to pools created from now
/// on; existing pools keep the share they snapshotted at creation.
pub fn set_protocol_fee(
    ledger: &mut dyn Ledger,
    caller: &str,
    dto: &SetProtocolFeeDto,
) -> DexResult<DexFeeConfig> {
    dto.validate()?;
    let key = keys::dex_fee_config_key();
    let mut config: DexFeeConfig = require_object(ledger, &key)?;
    if !config.is_authority(caller) {
        return Err(DexError::Unauthorized(format!(
            "{caller} is not a fee authority"
        )));
    }
    config.protocol_fee_bps = dto.protocol_fee_bps()?;
    put_object(ledger, &key, &config)?;
    info!("protocol fee set to {} bps", config.protocol_fee_bps);
    Ok(config)
}
