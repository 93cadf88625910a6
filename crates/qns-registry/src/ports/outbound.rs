//! # Outbound Ports (Driven Ports)
//!
//! Collaborators the registry depends on but does not implement: the
//! storage engine, the authorization oracle, fee metering, event delivery,
//! the clock and the post-transfer callback.
//!
//! The host supplies these; `crate::adapters` carries in-process versions
//! for the node binary and for tests.

use crate::domain::errors::{KVStoreError, RegistryError};
use crate::domain::value_objects::Account;
use crate::events::RegistryEvent;

/// Result of an ordered prefix scan.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

// =============================================================================
// STORAGE
// =============================================================================

/// Abstract interface for key-value database operations.
///
/// Keys are opaque byte strings built by `KeyPrefix`. The registry only
/// writes through `atomic_batch_write`, once per successful call.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch are applied, or NONE are.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

// =============================================================================
// AUTHORIZATION
// =============================================================================

/// Witness oracle for the current call.
///
/// A fresh authorizer is passed into every mutating operation, so tests can
/// substitute exactly the signatures a scenario needs.
pub trait Authorizer {
    /// True if the call carries `account`'s witness.
    fn is_authorized_as(&self, account: &Account) -> bool;

    /// True if the governance committee quorum signed the call.
    fn is_governance_quorum(&self) -> bool;
}

// =============================================================================
// FEES, EVENTS, TIME, HOOKS
// =============================================================================

/// Burns registration and renewal fees.
pub trait FeeMeter: Send + Sync {
    /// Burn `amount`. Fails with `InsufficientFunds` if it cannot be covered.
    fn charge(&mut self, amount: u64) -> Result<(), RegistryError>;

    /// Return a fee whose write set failed to reach storage.
    fn refund(&mut self, amount: u64);
}

/// Receives transfer and admin-change notifications after commit.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, event: RegistryEvent);
}

/// Wall-clock source in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Callback into contract-like recipients of a transfer.
///
/// Runs before the transfer is committed; an error aborts the transfer.
pub trait TransferHook: Send + Sync {
    /// True if `account` expects an `on_name_received` callback.
    fn is_contract(&self, account: &Account) -> bool;

    /// Deliver the token to a contract recipient.
    fn on_name_received(
        &self,
        from: Option<Account>,
        to: &Account,
        token_id: &str,
        data: Option<&[u8]>,
    ) -> Result<(), RegistryError>;
}
