use crate::domain::errors::RegistryError;
use crate::domain::value_objects::Account;
use crate::ports::outbound::TransferHook;
use std::collections::HashSet;

/// No account is a contract; transfers never call back.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransferHook;

impl TransferHook for NoopTransferHook {
    fn is_contract(&self, _account: &Account) -> bool {
        false
    }

    fn on_name_received(
        &self,
        _from: Option<Account>,
        _to: &Account,
        _token_id: &str,
        _data: Option<&[u8]>,
    ) -> Result<(), RegistryError> {
        Ok(())
    }
}

/// Treats the listed accounts as contracts that refuse every token.
#[derive(Debug, Default, Clone)]
pub struct RejectingTransferHook {
    contracts: HashSet<Account>,
}

impl RejectingTransferHook {
    pub fn new(contracts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            contracts: contracts.into_iter().collect(),
        }
    }
}

impl TransferHook for RejectingTransferHook {
    fn is_contract(&self, account: &Account) -> bool {
        self.contracts.contains(account)
    }

    fn on_name_received(
        &self,
        _from: Option<Account>,
        to: &Account,
        token_id: &str,
        _data: Option<&[u8]>,
    ) -> Result<(), RegistryError> {
        Err(RegistryError::TransferRejected {
            reason: format!("{to} refused {token_id}"),
        })
    }
}
