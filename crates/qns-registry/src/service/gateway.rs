//! # Pricing / Authorization Gateway
//!
//! Witness checks and the price table. Every mutating path goes through
//! one of the `check_*` helpers before it touches the ledger.

use tracing::warn;

use super::ledger::Ledger;
use crate::domain::entities::{NameState, PriceTable};
use crate::domain::errors::RegistryError;
use crate::domain::value_objects::{Account, KeyPrefix};
use crate::ports::outbound::{Authorizer, KeyValueStore};

/// Require the governance quorum.
pub(crate) fn check_committee(
    auth: &dyn Authorizer,
    action: &'static str,
) -> Result<(), RegistryError> {
    if auth.is_governance_quorum() {
        return Ok(());
    }
    warn!(action, "[qns] Committee witness missing");
    Err(RegistryError::NotAuthorized { action })
}

/// Require `account`'s own witness.
pub(crate) fn check_witness(
    auth: &dyn Authorizer,
    account: &Account,
    action: &'static str,
) -> Result<(), RegistryError> {
    if auth.is_authorized_as(account) {
        return Ok(());
    }
    warn!(action, account = %account, "[qns] Witness missing");
    Err(RegistryError::NotAuthorized { action })
}

/// Require the owner's or the admin's witness.
pub(crate) fn check_admin(
    auth: &dyn Authorizer,
    state: &NameState,
    action: &'static str,
) -> Result<(), RegistryError> {
    if auth.is_authorized_as(&state.owner) {
        return Ok(());
    }
    if let Some(admin) = &state.admin {
        if auth.is_authorized_as(admin) {
            return Ok(());
        }
    }
    warn!(action, name = %state.name, "[qns] Neither owner nor admin witnessed");
    Err(RegistryError::NotAuthorized { action })
}

impl<KV: KeyValueStore> Ledger<'_, KV> {
    pub fn price_table(&self) -> Result<PriceTable, RegistryError> {
        self.get(&KeyPrefix::price_key())?
            .ok_or_else(|| RegistryError::Corrupted {
                reason: "price table missing".to_string(),
            })
    }

    /// `table[length]` when listed, otherwise `table[0]`.
    pub fn get_price(&self, length: usize) -> Result<i64, RegistryError> {
        Ok(self.price_table()?.price_for(length))
    }

    pub fn set_price_table(
        &mut self,
        auth: &dyn Authorizer,
        prices: Vec<i64>,
        max_price: i64,
    ) -> Result<(), RegistryError> {
        check_committee(auth, "set the price table")?;
        let table = PriceTable::new(prices, max_price)?;
        self.put(KeyPrefix::price_key(), &table)
    }

    /// Gate a leaf of `length` characters: governance-reserved lengths need
    /// the quorum and are free, everything else burns `price * units`.
    pub fn charge(
        &mut self,
        auth: &dyn Authorizer,
        length: usize,
        units: u64,
    ) -> Result<(), RegistryError> {
        let price = self.get_price(length)?;
        if price < 0 {
            return check_committee(auth, "claim a reserved name");
        }
        let fee = (price as u64).checked_mul(units).ok_or_else(|| {
            RegistryError::out_of_range("fee", format!("{price} x {units} overflows"))
        })?;
        self.add_fee(fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryKVStore, StaticAuthorizer};

    fn store_with_prices(prices: Vec<i64>) -> InMemoryKVStore {
        let mut store = InMemoryKVStore::new();
        let bytes = bincode::serialize(&PriceTable::new(prices, 1_000).unwrap()).unwrap();
        store.put(&KeyPrefix::price_key(), &bytes).unwrap();
        store
    }

    #[test]
    fn test_check_admin_accepts_owner_or_admin() {
        let owner = Account::new([1; 20]);
        let admin = Account::new([2; 20]);
        let mut state = NameState::new(owner, "example.com", 10);
        assert!(check_admin(&StaticAuthorizer::signed_by([admin]), &state, "x").is_err());

        state.admin = Some(admin);
        assert!(check_admin(&StaticAuthorizer::signed_by([owner]), &state, "x").is_ok());
        assert!(check_admin(&StaticAuthorizer::signed_by([admin]), &state, "x").is_ok());
        assert!(check_admin(&StaticAuthorizer::committee(), &state, "x").is_err());
    }

    #[test]
    fn test_charge_scales_by_units() {
        let store = store_with_prices(vec![100, -1]);
        let mut ledger = Ledger::new(&store);
        ledger.charge(&StaticAuthorizer::none(), 7, 3).unwrap();
        assert_eq!(ledger.finish().fee, 300);
    }

    #[test]
    fn test_reserved_length_needs_committee_and_is_free() {
        let store = store_with_prices(vec![100, -1]);
        let mut ledger = Ledger::new(&store);
        assert!(matches!(
            ledger.charge(&StaticAuthorizer::none(), 1, 1),
            Err(RegistryError::NotAuthorized { .. })
        ));
        ledger.charge(&StaticAuthorizer::committee(), 1, 1).unwrap();
        assert_eq!(ledger.finish().fee, 0);
    }

    #[test]
    fn test_set_price_table_requires_quorum() {
        let store = store_with_prices(vec![100]);
        let mut ledger = Ledger::new(&store);
        assert!(ledger
            .set_price_table(&StaticAuthorizer::none(), vec![5], 1_000)
            .is_err());
        assert!(matches!(
            ledger.set_price_table(&StaticAuthorizer::committee(), vec![], 1_000),
            Err(RegistryError::OutOfRange { .. })
        ));
        ledger
            .set_price_table(&StaticAuthorizer::committee(), vec![5, -1], 1_000)
            .unwrap();
        assert_eq!(ledger.get_price(1).unwrap(), -1);
        assert_eq!(ledger.get_price(9).unwrap(), 5);
    }
}
