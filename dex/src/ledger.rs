//! External interfaces the engine consumes: a composite-key K/V store and a
//! token ledger.
//!
//! The engine itself is pure: every operation loads entities by key, computes
//! on owned values, and writes back at the end; the host commits the whole
//! transaction atomically. The in-memory implementations here back the test
//! suite and serve as reference behaviour for hosts.

use std::collections::BTreeMap;

use amm_math::UDecimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{DexError, DexResult};
use crate::pool::TokenKey;

/// Composite-key K/V store. Values are canonical JSON documents.
pub trait Ledger {
    fn get(&self, key: &str) -> DexResult<Option<Vec<u8>>>;
    fn put(&mut self, key: &str, value: Vec<u8>) -> DexResult<()>;
    fn delete(&mut self, key: &str) -> DexResult<()>;

    /// Key-ordered scan of everything under `prefix`, starting strictly after
    /// `bookmark` (a key returned by a previous page), up to `limit` entries.
    /// Returns the page and the bookmark for the next one, if any.
    fn get_range(
        &self,
        prefix: &str,
        bookmark: Option<&str>,
        limit: usize,
    ) -> DexResult<(Vec<(String, Vec<u8>)>, Option<String>)>;
}

/// Reads and deserializes an entity, `None` when absent.
pub fn get_object<T: DeserializeOwned>(ledger: &dyn Ledger, key: &str) -> DexResult<Option<T>> {
    match ledger.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Reads an entity that must exist.
pub fn require_object<T: DeserializeOwned>(ledger: &dyn Ledger, key: &str) -> DexResult<T> {
    get_object(ledger, key)?.ok_or_else(|| DexError::NotFound(key.replace('\u{0}', "|")))
}

/// Serializes and stores an entity. Struct fields serialize in declaration
/// order and all maps are `BTreeMap`, so the bytes are canonical.
pub fn put_object<T: Serialize>(ledger: &mut dyn Ledger, key: &str, value: &T) -> DexResult<()> {
    ledger.put(key, serde_json::to_vec(value)?)
}

/// Token balance and transfer operations, supplied by the host chain.
///
/// Transfers on behalf of another holder are assumed to have passed the
/// host's allowance checks before the engine is invoked.
pub trait TokenLedger {
    /// Current balance, zero for accounts never seen before.
    fn fetch_or_create_balance(&mut self, owner: &str, token: &TokenKey) -> DexResult<UDecimal>;

    fn transfer_token(
        &mut self,
        from: &str,
        to: &str,
        token: &TokenKey,
        amount: &UDecimal,
    ) -> DexResult<()>;
}

/// BTreeMap-backed store used by tests and local simulation.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    entries: BTreeMap<String, Vec<u8>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Ledger for InMemoryLedger {
    fn get(&self, key: &str) -> DexResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> DexResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> DexResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn get_range(
        &self,
        prefix: &str,
        bookmark: Option<&str>,
        limit: usize,
    ) -> DexResult<(Vec<(String, Vec<u8>)>, Option<String>)> {
        let mut page = Vec::new();
        let mut more = None;
        for (key, value) in self.entries.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            if let Some(mark) = bookmark {
                if key.as_str() <= mark {
                    continue;
                }
            }
            if page.len() == limit {
                more = page.last().map(|(k, _): &(String, Vec<u8>)| k.clone());
                break;
            }
            page.push((key.clone(), value.clone()));
        }
        Ok((page, more))
    }
}

/// BTreeMap-backed token ledger with non-negative balance enforcement.
#[derive(Debug, Default)]
pub struct InMemoryTokenLedger {
    balances: BTreeMap<(String, String), UDecimal>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits an account out of thin air; test setup only.
    pub fn mint(&mut self, owner: &str, token: &TokenKey, amount: &UDecimal) {
        let entry = self
            .balances
            .entry((owner.to_string(), token.0.clone()))
            .or_insert_with(UDecimal::zero);
        *entry = entry.add(amount);
    }

    pub fn balance(&self, owner: &str, token: &TokenKey) -> UDecimal {
        self.balances
            .get(&(owner.to_string(), token.0.clone()))
            .cloned()
            .unwrap_or_else(UDecimal::zero)
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn fetch_or_create_balance(&mut self, owner: &str, token: &TokenKey) -> DexResult<UDecimal> {
        Ok(self
            .balances
            .entry((owner.to_string(), token.0.clone()))
            .or_insert_with(UDecimal::zero)
            .clone())
    }

    fn transfer_token(
        &mut self,
        from: &str,
        to: &str,
        token: &TokenKey,
        amount: &UDecimal,
    ) -> DexResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let from_balance = self.fetch_or_create_balance(from, token)?;
        let remaining = from_balance.sub(amount).map_err(|_| {
            DexError::Conflict(format!(
                "insufficient balance: {from} holds {from_balance} {token}, needs {amount}",
                token = token.0
            ))
        })?;
        self.balances
            .insert((from.to_string(), token.0.clone()), remaining);
        let entry = self
            .balances
            .entry((to.to_string(), token.0.clone()))
            .or_insert_with(UDecimal::zero);
        *entry = entry.add(amount);
        Ok(())
    }
}
