//! # Domain Errors
//!
//! Error types for the name registry.
//!
//! Every failure aborts the whole call: the write set built for the call is
//! dropped and nothing is committed. `register` is the only operation that
//! reports an ordinary "name still taken" outcome as `Ok(false)` instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::records::RecordType;

/// Errors raised by registry, record store and resolver operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Name failed the grammar check.
    #[error("invalid name format: {reason}")]
    InvalidFormat { reason: String },

    /// Record payload failed type-specific validation.
    #[error("invalid {record_type} record data: {reason}")]
    InvalidRecord {
        record_type: RecordType,
        reason: String,
    },

    /// Token was never registered.
    #[error("unknown token: {name}")]
    UnknownToken { name: String },

    /// Root domain is not open for registration.
    #[error("unknown parent domain: {root}")]
    UnknownParent { root: String },

    /// Record does not exist.
    #[error("unknown record: {name} {record_type} #{id}")]
    UnknownRecord {
        name: String,
        record_type: RecordType,
        id: u8,
    },

    /// An ancestor of the name is missing or has lapsed.
    #[error("parent domain has expired: {name}")]
    ParentExpired { name: String },

    /// The token itself has lapsed.
    #[error("name has expired: {name}")]
    Expired { name: String },

    /// Root domain already registered.
    #[error("name already exists: {name}")]
    AlreadyExists { name: String },

    /// Identical record already stored for this name and type.
    #[error("duplicate {record_type} record for {name}")]
    DuplicateRecord {
        name: String,
        record_type: RecordType,
    },

    /// A name may carry at most one CNAME record, always at id 0.
    #[error("multiple CNAME records for {name}")]
    MultipleCname { name: String },

    /// Witness or quorum check failed.
    #[error("not authorized to {action}")]
    NotAuthorized { action: &'static str },

    /// Numeric argument outside its permitted range.
    #[error("{what} out of range: {detail}")]
    OutOfRange { what: &'static str, detail: String },

    /// All 256 record ids of a (name, type) are taken.
    #[error("too many {record_type} records for {name}")]
    TooManyRecords {
        name: String,
        record_type: RecordType,
    },

    /// Stored data is not in the expected shape.
    #[error("corrupted state: {reason}")]
    Corrupted { reason: String },

    /// CNAME chain longer than the redirect budget.
    #[error("too many redirections while resolving {name}")]
    TooManyRedirections { name: String },

    /// Fee meter could not cover the charge.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    /// Transfer recipient refused the token.
    #[error("transfer rejected by recipient: {reason}")]
    TransferRejected { reason: String },

    /// Underlying key-value store failed.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// State could not be encoded or decoded.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl RegistryError {
    /// Shorthand for grammar failures.
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Shorthand for range failures.
    pub fn out_of_range(what: &'static str, detail: impl Into<String>) -> Self {
        Self::OutOfRange {
            what,
            detail: detail.into(),
        }
    }

    /// Coarse classification used by callers and the node's JSON responses.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat { .. } | Self::InvalidRecord { .. } => ErrorKind::InvalidFormat,
            Self::UnknownToken { .. } | Self::UnknownRecord { .. } => ErrorKind::UnknownToken,
            Self::UnknownParent { .. } => ErrorKind::UnknownParent,
            Self::ParentExpired { .. } | Self::Expired { .. } => ErrorKind::ParentExpired,
            Self::AlreadyExists { .. }
            | Self::DuplicateRecord { .. }
            | Self::MultipleCname { .. } => ErrorKind::AlreadyExists,
            Self::NotAuthorized { .. } | Self::TransferRejected { .. } => ErrorKind::NotAuthorized,
            Self::OutOfRange { .. }
            | Self::TooManyRecords { .. }
            | Self::InsufficientFunds { .. } => ErrorKind::OutOfRange,
            Self::Corrupted { .. } | Self::Storage { .. } | Self::Serialization { .. } => {
                ErrorKind::Corrupted
            }
            Self::TooManyRedirections { .. } => ErrorKind::TooManyRedirections,
        }
    }
}

impl From<bincode::Error> for RegistryError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// Key-value store failures reported by storage adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    #[error("I/O error: {message}")]
    IOError { message: String },
    #[error("corrupted store: {message}")]
    Corruption { message: String },
}

impl From<KVStoreError> for RegistryError {
    fn from(err: KVStoreError) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}

/// Error taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidFormat,
    UnknownToken,
    UnknownParent,
    ParentExpired,
    AlreadyExists,
    NotAuthorized,
    OutOfRange,
    Corrupted,
    TooManyRedirections,
}

/// Serializable error for command responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&RegistryError> for RegistryErrorPayload {
    fn from(err: &RegistryError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_record_maps_to_already_exists() {
        let err = RegistryError::DuplicateRecord {
            name: "example.com".to_string(),
            record_type: RecordType::A,
        };
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(err.to_string().contains("example.com"));
    }

    #[test]
    fn test_record_ceiling_maps_to_out_of_range() {
        let err = RegistryError::TooManyRecords {
            name: "example.com".to_string(),
            record_type: RecordType::TXT,
        };
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_payload_from_error() {
        let err = RegistryError::TooManyRedirections {
            name: "a.com".to_string(),
        };
        let payload = RegistryErrorPayload::from(&err);
        assert_eq!(payload.kind, ErrorKind::TooManyRedirections);
        assert!(payload.message.contains("a.com"));
    }
}
