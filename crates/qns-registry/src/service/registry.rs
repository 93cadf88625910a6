//! # Domain Registry
//!
//! Ownership, expiration and balance bookkeeping for tokens.
//!
//! A token is a registered root (`com`) or second-level name
//! (`example.com`). Its life cycle is
//! `Unregistered -> Active -> Expired -> Active (reclaimed)`; expiry is
//! derived from the clock and never stored.

use tracing::{debug, info};

use super::gateway::{check_admin, check_committee, check_witness};
use super::ledger::Ledger;
use crate::domain::entities::NameState;
use crate::domain::errors::RegistryError;
use crate::domain::grammar::split_and_check;
use crate::domain::value_objects::{
    Account, KeyPrefix, MAX_REGISTRATION_YEARS, ONE_YEAR_MS, ONE_YEAR_SECS,
};
use crate::events::RegistryEvent;
use crate::ports::inbound::RegisterRequest;
use crate::ports::outbound::{Authorizer, KeyValueStore, TransferHook};

impl<KV: KeyValueStore> Ledger<'_, KV> {
    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub fn name_state(&self, token: &str) -> Result<Option<NameState>, RegistryError> {
        self.get(&KeyPrefix::name_key(token))
    }

    /// Walk from the root fragment inward to `fragments[first]`; true if
    /// any name on the way is unregistered or lapsed.
    pub fn parent_expired(
        &self,
        fragments: &[&str],
        first: usize,
        now: u64,
    ) -> Result<bool, RegistryError> {
        let Some(last) = fragments.len().checked_sub(1) else {
            return Ok(true);
        };
        let mut name = fragments[last].to_string();
        for i in (first..=last).rev() {
            if i != last {
                name = format!("{}.{}", fragments[i], name);
            }
            match self.name_state(&name)? {
                Some(state) if !state.is_expired(now) => {}
                _ => return Ok(true),
            }
        }
        Ok(false)
    }

    /// State of a registered, unexpired token whose ancestors are live.
    pub fn live_state(&self, token: &str, now: u64) -> Result<NameState, RegistryError> {
        let state = self
            .name_state(token)?
            .ok_or_else(|| RegistryError::UnknownToken {
                name: token.to_string(),
            })?;
        state.ensure_not_expired(now)?;
        let fragments: Vec<&str> = token.split('.').collect();
        if self.parent_expired(&fragments, 1, now)? {
            return Err(RegistryError::ParentExpired {
                name: token.to_string(),
            });
        }
        Ok(state)
    }

    pub fn total_supply(&self) -> Result<u64, RegistryError> {
        Ok(self.get(&KeyPrefix::total_supply_key())?.unwrap_or(0))
    }

    pub fn balance_of(&self, account: &Account) -> Result<u64, RegistryError> {
        Ok(self.get(&KeyPrefix::balance_key(account))?.unwrap_or(0))
    }

    /// Every token ever registered.
    pub fn tokens(&self) -> Result<Vec<String>, RegistryError> {
        let states: Vec<NameState> = self.scan(KeyPrefix::Name.as_bytes())?;
        Ok(states.into_iter().map(|s| s.name).collect())
    }

    pub fn tokens_of(&self, account: &Account) -> Result<Vec<String>, RegistryError> {
        self.scan(&KeyPrefix::account_tokens_prefix(account))
    }

    pub fn roots(&self) -> Result<Vec<String>, RegistryError> {
        let prefix = KeyPrefix::Root.as_bytes();
        self.scan_keys(prefix)?
            .into_iter()
            .map(|key| {
                String::from_utf8(key[prefix.len()..].to_vec()).map_err(|e| {
                    RegistryError::Corrupted {
                        reason: format!("root key is not UTF-8: {e}"),
                    }
                })
            })
            .collect()
    }

    pub fn is_available(&self, name: &str, now: u64) -> Result<bool, RegistryError> {
        let fragments = split_and_check(name, false)?;
        let root = fragments[fragments.len() - 1];
        if !self.contains(&KeyPrefix::root_key(root))? {
            if fragments.len() != 1 {
                return Err(RegistryError::UnknownParent {
                    root: root.to_string(),
                });
            }
            return Ok(true);
        }
        if self.get_price(fragments[0].len())? < 0 {
            return Ok(false);
        }
        self.parent_expired(&fragments, 0, now)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Register `request.name`. `Ok(false)` means a live registration
    /// still holds it; nothing is charged in that case.
    pub fn register(
        &mut self,
        auth: &dyn Authorizer,
        request: &RegisterRequest,
        now: u64,
    ) -> Result<bool, RegistryError> {
        let name = request.name.as_str();
        let fragments = split_and_check(name, false)?;
        let max_period = MAX_REGISTRATION_YEARS * ONE_YEAR_SECS;
        if !(1..=max_period).contains(&request.period_secs) {
            return Err(RegistryError::out_of_range(
                "registration period",
                format!("{}s outside 1..={max_period}s", request.period_secs),
            ));
        }
        request.soa.validate()?;

        if fragments.len() == 1 {
            check_committee(auth, "register a root domain")?;
            let root_key = KeyPrefix::root_key(name);
            if self.contains(&root_key)? {
                return Err(RegistryError::AlreadyExists {
                    name: name.to_string(),
                });
            }
            self.put(root_key, &0u64)?;
        } else {
            let root = fragments[1];
            if !self.contains(&KeyPrefix::root_key(root))? {
                return Err(RegistryError::UnknownParent {
                    root: root.to_string(),
                });
            }
            let parent = self
                .name_state(root)?
                .filter(|state| !state.is_expired(now))
                .ok_or_else(|| RegistryError::ParentExpired {
                    name: root.to_string(),
                })?;
            check_admin(auth, &parent, "register under this root")?;
        }
        check_witness(auth, &request.owner, "register for this owner")?;

        let previous = self.name_state(name)?;
        if let Some(held) = &previous {
            if !held.is_expired(now) {
                debug!(name, owner = %held.owner, "[qns] Name still registered");
                return Ok(false);
            }
        }

        let units = request.period_secs.div_ceil(ONE_YEAR_SECS);
        self.charge(auth, fragments[0].len(), units)?;

        match &previous {
            Some(expired) => self.reclaim(expired)?,
            None => {
                let supply = self.total_supply()?;
                self.put(KeyPrefix::total_supply_key(), &(supply + 1))?;
            }
        }

        let expiration = now
            .checked_add(request.period_secs * 1000)
            .ok_or_else(|| RegistryError::out_of_range("expiration", "overflows u64"))?;
        let state = NameState::new(request.owner, name, expiration);
        self.put(KeyPrefix::name_key(name), &state)?;
        self.adjust_balance(&request.owner, name, true)?;
        self.put_soa(name, &request.soa, now)?;
        self.emit(RegistryEvent::transfer(
            previous.map(|p| p.owner),
            request.owner,
            name,
        ));

        info!(name, owner = %request.owner, expiration, "[qns] Name registered");
        Ok(true)
    }

    /// Release an expired token from its previous owner and purge every
    /// record stored against it.
    fn reclaim(&mut self, expired: &NameState) -> Result<(), RegistryError> {
        self.adjust_balance(&expired.owner, &expired.name, false)?;
        let keys = self.scan_keys(&KeyPrefix::token_records_prefix(&expired.name))?;
        let purged = keys.len();
        for key in keys {
            self.delete(key);
        }
        info!(
            name = %expired.name,
            previous_owner = %expired.owner,
            purged,
            "[qns] Expired name reclaimed"
        );
        Ok(())
    }

    /// Move one token in or out of `owner`'s balance and index.
    fn adjust_balance(
        &mut self,
        owner: &Account,
        token: &str,
        credit: bool,
    ) -> Result<(), RegistryError> {
        let key = KeyPrefix::balance_key(owner);
        let balance = self.balance_of(owner)?;
        let next = if credit {
            balance.checked_add(1)
        } else {
            balance.checked_sub(1)
        }
        .ok_or_else(|| RegistryError::Corrupted {
            reason: format!("balance of {owner} out of bounds"),
        })?;
        if next == 0 {
            self.delete(key);
        } else {
            self.put(key, &next)?;
        }

        let index = KeyPrefix::account_token_key(owner, token);
        if credit {
            self.put(index, &token.to_string())
        } else {
            self.delete(index);
            Ok(())
        }
    }

    /// Add `years` to a live token's expiration; returns the new value.
    pub fn renew(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        years: u64,
        now: u64,
        max_years: u64,
    ) -> Result<u64, RegistryError> {
        if !(1..=MAX_REGISTRATION_YEARS).contains(&years) {
            return Err(RegistryError::out_of_range(
                "renewal years",
                format!("{years} outside 1..={MAX_REGISTRATION_YEARS}"),
            ));
        }
        let fragments = split_and_check(name, false)?;
        let mut state = self.live_state(name, now)?;
        self.charge(auth, fragments[0].len(), years)?;

        let expiration = state.expiration.saturating_add(years * ONE_YEAR_MS);
        let ceiling = now.saturating_add(max_years * ONE_YEAR_MS);
        if expiration > ceiling {
            return Err(RegistryError::out_of_range(
                "expiration",
                format!("{expiration} passes now + {max_years} years"),
            ));
        }
        state.expiration = expiration;
        self.put(KeyPrefix::name_key(name), &state)?;

        info!(name, years, expiration, "[qns] Name renewed");
        Ok(expiration)
    }

    /// Hand `token_id` to `to`. Clears the admin on an actual change.
    pub fn transfer(
        &mut self,
        auth: &dyn Authorizer,
        hook: &dyn TransferHook,
        to: Account,
        token_id: &str,
        data: Option<&[u8]>,
        now: u64,
    ) -> Result<(), RegistryError> {
        split_and_check(token_id, false)?;
        let mut state = self.live_state(token_id, now)?;
        let from = state.owner;
        check_witness(auth, &from, "transfer this name")?;
        if from == to {
            debug!(token_id, "[qns] Transfer to current owner");
            return Ok(());
        }

        state.owner = to;
        state.admin = None;
        self.put(KeyPrefix::name_key(token_id), &state)?;
        self.adjust_balance(&from, token_id, false)?;
        self.adjust_balance(&to, token_id, true)?;
        self.emit(RegistryEvent::transfer(Some(from), to, token_id));

        if hook.is_contract(&to) {
            hook.on_name_received(Some(from), &to, token_id, data)?;
        }

        info!(token_id, from = %from, to = %to, "[qns] Name transferred");
        Ok(())
    }

    /// Replace the admin. Needs the owner's witness and the new admin's.
    pub fn set_admin(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        admin: Option<Account>,
        now: u64,
    ) -> Result<(), RegistryError> {
        split_and_check(name, false)?;
        if let Some(new_admin) = &admin {
            check_witness(auth, new_admin, "accept the admin role")?;
        }
        let mut state = self.live_state(name, now)?;
        check_witness(auth, &state.owner, "set the admin")?;

        let old_admin = state.admin;
        state.admin = admin;
        self.put(KeyPrefix::name_key(name), &state)?;
        self.emit(RegistryEvent::AdminChanged {
            name: name.to_string(),
            old_admin,
            new_admin: admin,
        });

        info!(name, old = ?old_admin, new = ?admin, "[qns] Admin changed");
        Ok(())
    }
}
