//! # Value Objects
//!
//! Identities, protocol constants and the storage key layout.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

use super::errors::RegistryError;
use super::records::RecordType;

// =============================================================================
// CONSTANTS
// =============================================================================

/// One year in milliseconds (365 days).
pub const ONE_YEAR_MS: u64 = 365 * 24 * 3600 * 1000;

/// One year in seconds.
pub const ONE_YEAR_SECS: u64 = 365 * 24 * 3600;

/// Upper bound for renewal years and registration periods.
pub const MAX_REGISTRATION_YEARS: u64 = 10;

/// Price marker for names reserved to governance.
pub const GOVERNANCE_PRICE: i64 = -1;

// =============================================================================
// ACCOUNT (20 bytes)
// =============================================================================

/// Account identity (script hash style, 20 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Account(pub [u8; 20]);

impl Account {
    /// Creates an account from a 20-byte array.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Creates an account from a slice. Returns None if wrong length.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(slice).ok().map(Self)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Account {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| RegistryError::invalid_format(format!("account {s:?}: {e}")))?;
        Self::from_slice(&bytes)
            .ok_or_else(|| RegistryError::invalid_format(format!("account {s:?} is not 20 bytes")))
    }
}

impl From<[u8; 20]> for Account {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Account {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// STORAGE KEYS
// =============================================================================

/// 32-byte Keccak-256 digest of a name component.
pub type NameHash = [u8; 32];

/// Keccak-256 of a name, used to build fixed-width key segments.
pub fn name_hash(name: &str) -> NameHash {
    Keccak256::digest(name.as_bytes()).into()
}

/// Key prefixes for the key-value store.
///
/// Every map the registry keeps lives under its own one-byte prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Total supply counter: `0x00` -> u64
    TotalSupply,
    /// Balance per account: `0x01 ++ account` -> u64
    Balance,
    /// Enumeration index: `0x02 ++ account ++ hash(token)` -> token name
    AccountToken,
    /// Price table: `0x11` -> Vec<i64>
    RegisterPrice,
    /// Open roots: `0x20 ++ root` -> 0
    Root,
    /// Name state: `0x21 ++ hash(token)` -> NameState
    Name,
    /// Records: `0x22 ++ hash(token) ++ hash(name) ++ type ++ id` -> RecordState
    Record,
}

impl KeyPrefix {
    /// Get the byte prefix for this key type.
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::TotalSupply => &[0x00],
            KeyPrefix::Balance => &[0x01],
            KeyPrefix::AccountToken => &[0x02],
            KeyPrefix::RegisterPrice => &[0x11],
            KeyPrefix::Root => &[0x20],
            KeyPrefix::Name => &[0x21],
            KeyPrefix::Record => &[0x22],
        }
    }

    /// Build a full key with the given suffix.
    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix);
        key
    }

    pub fn total_supply_key() -> Vec<u8> {
        KeyPrefix::TotalSupply.key(&[])
    }

    pub fn price_key() -> Vec<u8> {
        KeyPrefix::RegisterPrice.key(&[])
    }

    pub fn balance_key(account: &Account) -> Vec<u8> {
        KeyPrefix::Balance.key(account.as_bytes())
    }

    /// Prefix of every token held by `account`.
    pub fn account_tokens_prefix(account: &Account) -> Vec<u8> {
        KeyPrefix::AccountToken.key(account.as_bytes())
    }

    pub fn account_token_key(account: &Account, token: &str) -> Vec<u8> {
        let mut key = Self::account_tokens_prefix(account);
        key.extend_from_slice(&name_hash(token));
        key
    }

    pub fn root_key(root: &str) -> Vec<u8> {
        KeyPrefix::Root.key(root.as_bytes())
    }

    pub fn name_key(token: &str) -> Vec<u8> {
        KeyPrefix::Name.key(&name_hash(token))
    }

    /// Prefix of every record stored against `token`.
    pub fn token_records_prefix(token: &str) -> Vec<u8> {
        KeyPrefix::Record.key(&name_hash(token))
    }

    /// Prefix of every record for one exact name.
    pub fn name_records_prefix(token: &str, name: &str) -> Vec<u8> {
        let mut key = Self::token_records_prefix(token);
        key.extend_from_slice(&name_hash(name));
        key
    }

    /// Prefix of every record for one exact name and type.
    pub fn typed_records_prefix(token: &str, name: &str, record_type: RecordType) -> Vec<u8> {
        let mut key = Self::name_records_prefix(token, name);
        key.push(record_type.as_byte());
        key
    }

    pub fn record_key(token: &str, name: &str, record_type: RecordType, id: u8) -> Vec<u8> {
        let mut key = Self::typed_records_prefix(token, name, record_type);
        key.push(id);
        key
    }
}
