//! # Domain Entities
//!
//! Stored state for registered names and their records.

use serde::{Deserialize, Serialize};

use super::errors::RegistryError;
use super::records::RecordType;
use super::value_objects::{Account, GOVERNANCE_PRICE};

/// Ownership state of one registered root or second-level name.
///
/// ## Invariants
///
/// - `expiration` only grows through renewal.
/// - A transfer clears `admin`.
/// - Never deleted: re-registration after expiry overwrites every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameState {
    pub owner: Account,
    pub name: String,
    /// Absolute expiry, milliseconds since epoch.
    pub expiration: u64,
    pub admin: Option<Account>,
}

impl NameState {
    /// Fresh state for a new registration.
    pub fn new(owner: Account, name: impl Into<String>, expiration: u64) -> Self {
        Self {
            owner,
            name: name.into(),
            expiration,
            admin: None,
        }
    }

    /// Expiry is a derived predicate, not a stored state.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expiration
    }

    pub fn ensure_not_expired(&self, now_ms: u64) -> Result<(), RegistryError> {
        if self.is_expired(now_ms) {
            return Err(RegistryError::Expired {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Properties exposed through `properties_of`.
    pub fn properties(&self) -> TokenProperties {
        TokenProperties {
            name: self.name.clone(),
            expiration: self.expiration,
            admin: self.admin,
        }
    }
}

/// Public view of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenProperties {
    pub name: String,
    pub expiration: u64,
    pub admin: Option<Account>,
}

/// One DNS record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordState {
    /// Exact name the record answers for, possibly deeper than its token.
    pub name: String,
    pub record_type: RecordType,
    pub id: u8,
    pub data: String,
}

impl RecordState {
    pub fn new(name: impl Into<String>, record_type: RecordType, id: u8, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type,
            id,
            data: data.into(),
        }
    }
}

/// Registration prices indexed by leaf fragment length.
///
/// Index 0 is the default for lengths past the end of the table.
/// [`GOVERNANCE_PRICE`] marks lengths reserved to governance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable(Vec<i64>);

impl PriceTable {
    /// Build a table, checking every entry against `max_price`.
    pub fn new(prices: Vec<i64>, max_price: i64) -> Result<Self, RegistryError> {
        if prices.is_empty() {
            return Err(RegistryError::out_of_range("price table", "must not be empty"));
        }
        if let Some(bad) = prices
            .iter()
            .find(|&&p| p < GOVERNANCE_PRICE || p > max_price)
        {
            return Err(RegistryError::out_of_range(
                "price",
                format!("{bad} outside {GOVERNANCE_PRICE}..={max_price}"),
            ));
        }
        Ok(Self(prices))
    }

    /// Price for a leaf of `length` characters.
    pub fn price_for(&self, length: usize) -> i64 {
        self.0.get(length).copied().unwrap_or(self.0[0])
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}
