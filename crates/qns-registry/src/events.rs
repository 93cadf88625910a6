//! # Registry Events
//!
//! Notifications published after a call commits. Events buffered by a call
//! that fails are discarded with its write set.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Account;

/// Notification emitted by a committed registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// Token ownership changed. `from` is `None` for a fresh registration.
    Transfer {
        from: Option<Account>,
        to: Option<Account>,
        /// Always 1: names are indivisible.
        amount: u64,
        token_id: String,
    },
    /// Token admin changed.
    AdminChanged {
        name: String,
        old_admin: Option<Account>,
        new_admin: Option<Account>,
    },
}

impl RegistryEvent {
    pub fn transfer(from: Option<Account>, to: Account, token_id: impl Into<String>) -> Self {
        Self::Transfer {
            from,
            to: Some(to),
            amount: 1,
            token_id: token_id.into(),
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "transfer",
            Self::AdminChanged { .. } => "admin_changed",
        }
    }
}
