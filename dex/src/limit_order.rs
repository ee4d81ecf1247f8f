//! Commit–reveal limit orders.
//!
//! Placing an order stores only a SHA-256 commitment over the order's fields;
//! an authorised filler later reveals them, the engine recomputes the hash,
//! verifies it against the stored commitment, and settles the order through
//! the swap engine. The commitment string encoding below is bit-exact wire
//! format and must never change.

use amm_math::{Rounding, UDecimal};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{DexError, DexResult};

/// A placed, not-yet-revealed order. Keyed by its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrderCommitment {
    pub hash: String,
    /// Unix seconds; zero means the order never expires.
    pub expires: u64,
}

/// Singleton set of wallets allowed to fill revealed orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLimitOrderConfig {
    pub limit_order_admin_wallets: Vec<String>,
}

impl GlobalLimitOrderConfig {
    pub fn is_admin(&self, user: &str) -> bool {
        self.limit_order_admin_wallets.iter().any(|w| w == user)
    }
}

/// The revealed order fields, exactly as they were committed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrderReveal {
    pub owner: String,
    pub selling_token: String,
    pub buying_token: String,
    pub selling_amount: UDecimal,
    pub buying_minimum: UDecimal,
    pub buying_to_selling_ratio: UDecimal,
    pub expires: u64,
    pub commitment_nonce: String,
}

impl LimitOrderReveal {
    /// Canonical commitment string:
    /// `owner/sell/buy/sellAmt/buyMin/ratio/expires/nonce`.
    pub fn commitment_string(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}/{}/{}",
            self.owner,
            self.selling_token,
            self.buying_token,
            self.selling_amount,
            self.buying_minimum,
            self.buying_to_selling_ratio,
            self.expires,
            self.commitment_nonce
        )
    }

    /// Lowercase-hex SHA-256 of the commitment string.
    pub fn commitment_hash(&self) -> String {
        hex::encode(Sha256::digest(self.commitment_string().as_bytes()))
    }
}

/// Checks the stored-hash wire format: 64 lowercase hex characters.
pub fn validate_commitment_hash(hash: &str) -> DexResult<()> {
    let well_formed = hash.len() == 64
        && hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if well_formed {
        Ok(())
    } else {
        Err(DexError::ValidationFailed(format!(
            "malformed commitment hash {hash:?}"
        )))
    }
}

/// Decimal square root by Newton iteration, used to turn a price ratio into
/// a sqrt-price bound. Deterministic: every division is 20 dp half-up and
/// iteration stops at a fixed point or the iteration cap.
pub fn decimal_sqrt(value: &UDecimal) -> DexResult<UDecimal> {
    if value.is_zero() {
        return Ok(UDecimal::zero());
    }
    let two = UDecimal::new("2").expect("static constant");
    let mut guess = if *value >= UDecimal::one() {
        value.clone()
    } else {
        UDecimal::one()
    };
    // sqrt halves the exponent, so 128 iterations dominate any 20-dp input.
    for _ in 0..128 {
        let quotient = value.div(&guess, Rounding::HalfUp)?;
        let next = guess.add(&quotient).div(&two, Rounding::HalfUp)?;
        if next == guess {
            break;
        }
        guess = next;
    }
    Ok(guess)
}
