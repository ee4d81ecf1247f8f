//! Composite ledger keys and deterministic pool identity.
//!
//! Keys are the object-type prefix plus its components, joined by a `\u{0}`
//! separator (component strings may contain `|`, so the separator must be a
//! character that never appears in user data). The pool hash is the SHA-256
//! of the canonical `token0/token1/fee` identity string and doubles as the
//! pool's content address everywhere tick data and positions are keyed.

use sha2::{Digest, Sha256};

use crate::pool::TokenKey;

/// Key separator; never present in component values.
pub const KEY_SEPARATOR: char = '\u{0}';

/// Object-type prefixes of every stored entity.
pub mod object_type {
    pub const POOL: &str = "GCDXCHLPPL";
    pub const TICK_DATA: &str = "GCDXCHLPTD";
    pub const POSITION: &str = "GCDXCHLPPO";
    pub const USER_POSITION_INDEX: &str = "GCDXCHLPUP";
    pub const LIMIT_ORDER_COMMITMENT: &str = "GCDXCHLPLO";
    pub const GLOBAL_LIMIT_ORDER_CONFIG: &str = "GCDPGLOC";
    pub const DEX_FEE_CONFIG: &str = "GCDPFC";
}

/// Builds a composite key from an object type and its components.
pub fn composite_key(object: &str, components: &[&str]) -> String {
    let mut key = String::from(object);
    for part in components {
        key.push(KEY_SEPARATOR);
        key.push_str(part);
    }
    key
}

/// SHA-256 hex over `token0/token1/fee`; the pool's deterministic identity.
pub fn pool_hash(token0: &TokenKey, token1: &TokenKey, fee: u32) -> String {
    let identity = format!("{}/{}/{}", token0.0, token1.0, fee);
    hex::encode(Sha256::digest(identity.as_bytes()))
}

/// Token-ledger account that custodies a pool's funds.
pub fn pool_alias(hash: &str) -> String {
    format!("service|pool_{hash}")
}

pub fn pool_key(token0: &TokenKey, token1: &TokenKey, fee: u32) -> String {
    composite_key(
        object_type::POOL,
        &[&token0.0, &token1.0, &fee.to_string()],
    )
}

pub fn tick_data_key(pool_hash: &str, tick: i32) -> String {
    composite_key(object_type::TICK_DATA, &[pool_hash, &tick.to_string()])
}

pub fn position_key(pool_hash: &str, tick_upper: i32, tick_lower: i32, position_id: &str) -> String {
    composite_key(
        object_type::POSITION,
        &[
            pool_hash,
            &tick_upper.to_string(),
            &tick_lower.to_string(),
            position_id,
        ],
    )
}

pub fn user_position_index_key(user: &str, pool_hash: &str) -> String {
    composite_key(object_type::USER_POSITION_INDEX, &[user, pool_hash])
}

pub fn limit_order_commitment_key(hash: &str) -> String {
    composite_key(object_type::LIMIT_ORDER_COMMITMENT, &[hash])
}

pub fn global_limit_order_config_key() -> String {
    object_type::GLOBAL_LIMIT_ORDER_CONFIG.to_string()
}

pub fn dex_fee_config_key() -> String {
    object_type::DEX_FEE_CONFIG.to_string()
}
