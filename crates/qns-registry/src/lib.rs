//! # QNS Registry - Decentralized Name Service Core
//!
//! Issues ownable, time-leased names in a two-level hierarchy (root
//! domains such as `com`, second-level names such as `example.com`), stores
//! typed DNS records against them and resolves queries through CNAME
//! chains.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Names pass the grammar before anything else | `domain/grammar.rs` - `split_and_check()` |
//! | A lapsed ancestor disables every name below it | `service/registry.rs` - `parent_expired()` |
//! | Expiration never passes `now + 10 years` | `service/registry.rs` - `renew()` |
//! | Every token has one SOA record at id 0 | `service/records.rs` - `put_soa()` |
//! | At most one CNAME per exact name, at id 0 | `service/records.rs` - `set_record()`, `add_record()` |
//! | A call commits everything or nothing | `service/ledger.rs` - `Ledger` |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `KeyValueStore` | Ordered storage with atomic batches |
//! | `Authorizer` | Witness and governance quorum checks |
//! | `FeeMeter` | Fee burning |
//! | `NotificationSink` | Transfer and admin-change events |
//! | `Clock` | Milliseconds since epoch |
//! | `TransferHook` | Callback into contract recipients |
//!
//! ## Usage Example
//!
//! ```ignore
//! use qns_registry::prelude::*;
//!
//! let committee = StaticAuthorizer::committee().with_witness(owner);
//! service.register(&committee, RegisterRequest::new("com", owner, soa.clone()))?;
//! service.register(&StaticAuthorizer::signed_by([owner]), RegisterRequest::new("example.com", owner, soa))?;
//! service.add_record(&StaticAuthorizer::signed_by([owner]), "example.com", RecordType::A, "93.184.216.34")?;
//! assert_eq!(service.resolve("example.com", RecordType::A)?, vec!["93.184.216.34"]);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::entities::{NameState, PriceTable, RecordState, TokenProperties};
    pub use crate::domain::errors::{ErrorKind, RegistryError, RegistryErrorPayload};
    pub use crate::domain::grammar::{canonical_token, check_fragment, normalize, split_and_check};
    pub use crate::domain::records::{RecordType, SoaFields, SoaRecord};
    pub use crate::domain::value_objects::{Account, ONE_YEAR_MS, ONE_YEAR_SECS};

    // Ports
    pub use crate::ports::inbound::{NameServiceApi, RegisterRequest};
    pub use crate::ports::outbound::{
        Authorizer, BatchOperation, Clock, FeeMeter, KeyValueStore, NotificationSink,
        TransferHook,
    };

    // Adapters
    pub use crate::adapters::{
        FileBackedKVStore, InMemoryKVStore, ManualClock, MeteredFeeMeter, NoopTransferHook,
        RecordingSink, RejectingTransferHook, StaticAuthorizer, SystemClock, TracingSink,
    };

    // Service
    pub use crate::config::RegistryConfig;
    pub use crate::events::RegistryEvent;
    pub use crate::service::{NameService, NameServiceDependencies};
}

pub use domain::errors::RegistryError;
pub use service::{NameService, NameServiceDependencies};
