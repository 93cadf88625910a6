use crate::domain::value_objects::Account;
use crate::ports::outbound::Authorizer;
use std::collections::HashSet;

/// Authorizer with a fixed set of witnesses.
#[derive(Debug, Default, Clone)]
pub struct StaticAuthorizer {
    witnesses: HashSet<Account>,
    quorum: bool,
}

impl StaticAuthorizer {
    /// No witnesses, no quorum.
    pub fn none() -> Self {
        Self::default()
    }

    /// Signed by `accounts`.
    pub fn signed_by(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            witnesses: accounts.into_iter().collect(),
            quorum: false,
        }
    }

    /// Signed by the governance quorum only.
    pub fn committee() -> Self {
        Self {
            witnesses: HashSet::new(),
            quorum: true,
        }
    }

    #[must_use]
    pub fn with_witness(mut self, account: Account) -> Self {
        self.witnesses.insert(account);
        self
    }

    #[must_use]
    pub fn with_quorum(mut self, quorum: bool) -> Self {
        self.quorum = quorum;
        self
    }
}

impl Authorizer for StaticAuthorizer {
    fn is_authorized_as(&self, account: &Account) -> bool {
        self.witnesses.contains(account)
    }

    fn is_governance_quorum(&self) -> bool {
        self.quorum
    }
}
