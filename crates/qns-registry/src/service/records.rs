//! # Record Store
//!
//! DNS records keyed by `(token, exact name, type, id)`. A record name may
//! be deeper than its token (`www.example.com` under `example.com`); the
//! record is still stored against the token, so reclaiming the token purges
//! it.

use tracing::{debug, info};

use super::gateway::check_admin;
use super::ledger::Ledger;
use crate::domain::entities::{NameState, RecordState};
use crate::domain::errors::RegistryError;
use crate::domain::grammar::{split_and_check, token_from_fragments};
use crate::domain::records::{refresh_serial, validate_payload, RecordType, SoaFields, SoaRecord};
use crate::domain::value_objects::KeyPrefix;
use crate::ports::outbound::{Authorizer, KeyValueStore};

impl<KV: KeyValueStore> Ledger<'_, KV> {
    /// Live state of the token that owns record name `name`.
    fn record_owner(&self, name: &str, now: u64) -> Result<NameState, RegistryError> {
        let fragments = split_and_check(name, true)?;
        let token = token_from_fragments(&fragments);
        self.live_state(&token, now)
    }

    /// Same as `record_owner`, plus the owner-or-admin witness.
    fn managed_owner(
        &self,
        auth: &dyn Authorizer,
        name: &str,
        now: u64,
        action: &'static str,
    ) -> Result<NameState, RegistryError> {
        let state = self.record_owner(name, now)?;
        check_admin(auth, &state, action)?;
        Ok(state)
    }

    // =========================================================================
    // SOA
    // =========================================================================

    /// Write the token's SOA record in full.
    pub fn put_soa(
        &mut self,
        token: &str,
        fields: &SoaFields,
        serial: u64,
    ) -> Result<(), RegistryError> {
        let soa = SoaRecord::new(token, fields, serial);
        let record = RecordState::new(token, RecordType::SOA, 0, soa.to_payload());
        self.put(KeyPrefix::record_key(token, token, RecordType::SOA, 0), &record)
    }

    /// Rewrite only the SOA serial to `now`.
    pub fn refresh_soa_serial(&mut self, token: &str, now: u64) -> Result<(), RegistryError> {
        let key = KeyPrefix::record_key(token, token, RecordType::SOA, 0);
        let mut record: RecordState =
            self.get(&key)?.ok_or_else(|| RegistryError::Corrupted {
                reason: format!("SOA record missing for {token}"),
            })?;
        record.data = refresh_serial(&record.data, now)?;
        self.put(key, &record)
    }

    pub fn update_soa(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        fields: &SoaFields,
        now: u64,
    ) -> Result<(), RegistryError> {
        split_and_check(name, false)?;
        fields.validate()?;
        let state = self.live_state(name, now)?;
        check_admin(auth, &state, "update the SOA record")?;
        self.put_soa(&state.name, fields, now)?;
        info!(name, "[qns] SOA updated");
        Ok(())
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Upsert the record at `id`.
    pub fn set_record(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
        id: u8,
        data: &str,
        now: u64,
    ) -> Result<(), RegistryError> {
        split_and_check(name, true)?;
        validate_payload(record_type, data)?;
        let state = self.managed_owner(auth, name, now, "set a record")?;
        if record_type == RecordType::CNAME && id != 0 {
            return Err(RegistryError::MultipleCname {
                name: name.to_string(),
            });
        }

        let record = RecordState::new(name, record_type, id, data);
        self.put(KeyPrefix::record_key(&state.name, name, record_type, id), &record)?;
        self.refresh_soa_serial(&state.name, now)?;
        info!(name, %record_type, id, "[qns] Record set");
        Ok(())
    }

    /// Store a new record under the lowest free id and return that id.
    pub fn add_record(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
        data: &str,
        now: u64,
    ) -> Result<u8, RegistryError> {
        split_and_check(name, true)?;
        validate_payload(record_type, data)?;
        let state = self.managed_owner(auth, name, now, "add a record")?;

        let existing: Vec<RecordState> =
            self.scan(&KeyPrefix::typed_records_prefix(&state.name, name, record_type))?;
        if existing.iter().any(|r| r.data == data) {
            return Err(RegistryError::DuplicateRecord {
                name: name.to_string(),
                record_type,
            });
        }
        if record_type == RecordType::CNAME && !existing.is_empty() {
            return Err(RegistryError::MultipleCname {
                name: name.to_string(),
            });
        }

        // `existing` is ordered by id; the first gap is the lowest free id.
        let mut id: u16 = 0;
        for record in &existing {
            if u16::from(record.id) != id {
                break;
            }
            id += 1;
        }
        let id = u8::try_from(id).map_err(|_| RegistryError::TooManyRecords {
            name: name.to_string(),
            record_type,
        })?;

        let record = RecordState::new(name, record_type, id, data);
        self.put(KeyPrefix::record_key(&state.name, name, record_type, id), &record)?;
        self.refresh_soa_serial(&state.name, now)?;
        info!(name, %record_type, id, "[qns] Record added");
        Ok(id)
    }

    pub fn delete_record(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
        id: u8,
        now: u64,
    ) -> Result<(), RegistryError> {
        reject_soa_delete(record_type)?;
        let state = self.managed_owner(auth, name, now, "delete a record")?;
        let key = KeyPrefix::record_key(&state.name, name, record_type, id);
        if !self.contains(&key)? {
            return Err(RegistryError::UnknownRecord {
                name: name.to_string(),
                record_type,
                id,
            });
        }
        self.delete(key);
        self.refresh_soa_serial(&state.name, now)?;
        info!(name, %record_type, id, "[qns] Record deleted");
        Ok(())
    }

    pub fn delete_records(
        &mut self,
        auth: &dyn Authorizer,
        name: &str,
        record_type: RecordType,
        now: u64,
    ) -> Result<(), RegistryError> {
        reject_soa_delete(record_type)?;
        let state = self.managed_owner(auth, name, now, "delete records")?;
        let keys = self.scan_keys(&KeyPrefix::typed_records_prefix(&state.name, name, record_type))?;
        let deleted = keys.len();
        for key in keys {
            self.delete(key);
        }
        self.refresh_soa_serial(&state.name, now)?;
        info!(name, %record_type, deleted, "[qns] Records deleted");
        Ok(())
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn get_records(
        &self,
        name: &str,
        record_type: RecordType,
        now: u64,
    ) -> Result<Vec<String>, RegistryError> {
        let state = self.record_owner(name, now)?;
        let records: Vec<RecordState> =
            self.scan(&KeyPrefix::typed_records_prefix(&state.name, name, record_type))?;
        debug!(name, %record_type, count = records.len(), "[qns] Records read");
        Ok(records.into_iter().map(|r| r.data).collect())
    }

    pub fn get_record(
        &self,
        name: &str,
        record_type: RecordType,
        id: u8,
        now: u64,
    ) -> Result<Option<String>, RegistryError> {
        let state = self.record_owner(name, now)?;
        let record: Option<RecordState> =
            self.get(&KeyPrefix::record_key(&state.name, name, record_type, id))?;
        Ok(record.map(|r| r.data))
    }

    pub fn get_all_records(&self, name: &str, now: u64) -> Result<Vec<RecordState>, RegistryError> {
        let state = self.record_owner(name, now)?;
        self.scan(&KeyPrefix::name_records_prefix(&state.name, name))
    }
}

fn reject_soa_delete(record_type: RecordType) -> Result<(), RegistryError> {
    if record_type == RecordType::SOA {
        return Err(RegistryError::InvalidRecord {
            record_type,
            reason: "SOA records cannot be deleted".to_string(),
        });
    }
    Ok(())
}
