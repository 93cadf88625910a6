//! # Call Ledger
//!
//! Write set for one registry call. Reads see the call's own pending writes;
//! nothing reaches the store until the service commits the finished set in a
//! single `atomic_batch_write`. Dropping a ledger discards its writes, events
//! and fees, which is how every error path rolls back.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::errors::RegistryError;
use crate::events::RegistryEvent;
use crate::ports::outbound::{BatchOperation, KeyValueStore};

/// Everything a successful call wants to apply.
#[derive(Debug, Default)]
pub(crate) struct WriteSet {
    pub operations: Vec<BatchOperation>,
    pub events: Vec<RegistryEvent>,
    pub fee: u64,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.events.is_empty() && self.fee == 0
    }
}

/// Overlay of pending writes on top of a read-only store handle.
pub(crate) struct Ledger<'a, KV: KeyValueStore> {
    store: &'a KV,
    /// `None` marks a pending delete.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    events: Vec<RegistryEvent>,
    fee: u64,
}

impl<'a, KV: KeyValueStore> Ledger<'a, KV> {
    pub fn new(store: &'a KV) -> Self {
        Self {
            store,
            writes: BTreeMap::new(),
            events: Vec::new(),
            fee: 0,
        }
    }

    // =========================================================================
    // RAW ACCESS
    // =========================================================================

    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, RegistryError> {
        match self.writes.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => Ok(self.store.get(key)?),
        }
    }

    pub fn contains(&self, key: &[u8]) -> Result<bool, RegistryError> {
        match self.writes.get(key) {
            Some(pending) => Ok(pending.is_some()),
            None => Ok(self.store.exists(key)?),
        }
    }

    pub fn put_raw(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    /// Entries under `prefix` in key order, pending writes applied.
    pub fn scan_raw(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, RegistryError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.store.prefix_scan(prefix)?.into_iter().collect();
        for (key, pending) in self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match pending {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    // =========================================================================
    // TYPED ACCESS (bincode)
    // =========================================================================

    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, RegistryError> {
        self.get_raw(key)?
            .map(|bytes| bincode::deserialize(&bytes).map_err(RegistryError::from))
            .transpose()
    }

    pub fn put<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<(), RegistryError> {
        let bytes = bincode::serialize(value)?;
        self.put_raw(key, bytes);
        Ok(())
    }

    /// Decoded values under `prefix`, in key order.
    pub fn scan<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<T>, RegistryError> {
        self.scan_raw(prefix)?
            .into_iter()
            .map(|(_, bytes)| bincode::deserialize(&bytes).map_err(RegistryError::from))
            .collect()
    }

    /// Keys under `prefix`, in key order.
    pub fn scan_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, RegistryError> {
        Ok(self.scan_raw(prefix)?.into_iter().map(|(k, _)| k).collect())
    }

    // =========================================================================
    // EVENTS & FEES
    // =========================================================================

    /// Queue an event for publication after commit.
    pub fn emit(&mut self, event: RegistryEvent) {
        self.events.push(event);
    }

    /// Queue a fee burn for commit.
    pub fn add_fee(&mut self, amount: u64) -> Result<(), RegistryError> {
        self.fee = self
            .fee
            .checked_add(amount)
            .ok_or_else(|| RegistryError::out_of_range("fee", "total overflows u64"))?;
        Ok(())
    }

    /// Close the ledger and hand back what should be committed.
    pub fn finish(self) -> WriteSet {
        let operations = self
            .writes
            .into_iter()
            .map(|(key, pending)| match pending {
                Some(value) => BatchOperation::Put { key, value },
                None => BatchOperation::Delete { key },
            })
            .collect();
        WriteSet {
            operations,
            events: self.events,
            fee: self.fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryKVStore;
    use crate::domain::value_objects::Account;

    fn seeded() -> InMemoryKVStore {
        let mut store = InMemoryKVStore::new();
        store.put(&[1, 1], &[10]).unwrap();
        store.put(&[1, 2], &[20]).unwrap();
        store.put(&[2, 1], &[30]).unwrap();
        store
    }

    #[test]
    fn test_reads_see_pending_writes() {
        let store = seeded();
        let mut ledger = Ledger::new(&store);
        ledger.put_raw(vec![1, 3], vec![40]);
        ledger.delete(vec![1, 1]);

        assert_eq!(ledger.get_raw(&[1, 3]).unwrap(), Some(vec![40]));
        assert_eq!(ledger.get_raw(&[1, 1]).unwrap(), None);
        assert!(!ledger.contains(&[1, 1]).unwrap());
        assert!(ledger.contains(&[1, 2]).unwrap());

        let keys = ledger.scan_keys(&[1]).unwrap();
        assert_eq!(keys, vec![vec![1, 2], vec![1, 3]]);
    }

    #[test]
    fn test_dropping_ledger_leaves_store_untouched() {
        let store = seeded();
        {
            let mut ledger = Ledger::new(&store);
            ledger.delete(vec![1, 1]);
            ledger.add_fee(5).unwrap();
        }
        assert_eq!(store.get(&[1, 1]).unwrap(), Some(vec![10]));
    }

    #[test]
    fn test_finish_collects_operations_events_and_fees() {
        let store = seeded();
        let mut ledger = Ledger::new(&store);
        ledger.put(vec![9], &7u64).unwrap();
        ledger.delete(vec![2, 1]);
        ledger.emit(RegistryEvent::transfer(None, Account::new([1; 20]), "a.com"));
        ledger.add_fee(3).unwrap();
        ledger.add_fee(4).unwrap();

        let set = ledger.finish();
        assert_eq!(set.operations.len(), 2);
        assert!(matches!(set.operations[0], BatchOperation::Delete { .. }));
        assert_eq!(set.events.len(), 1);
        assert_eq!(set.fee, 7);
    }

    #[test]
    fn test_fee_overflow_is_out_of_range() {
        let store = InMemoryKVStore::new();
        let mut ledger = Ledger::new(&store);
        ledger.add_fee(u64::MAX).unwrap();
        assert!(matches!(
            ledger.add_fee(1),
            Err(RegistryError::OutOfRange { .. })
        ));
    }
}
