//! # Adapters Module
//!
//! In-process implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `storage`: ordered in-memory and file-backed key-value stores
//! - `infra`: clocks, authorizer, fee meter, event sinks, transfer hooks

pub mod infra;
pub mod storage;

pub use infra::*;
pub use storage::{FileBackedKVStore, InMemoryKVStore};
