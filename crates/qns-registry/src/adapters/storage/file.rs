use super::memory::InMemoryKVStore;
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File-backed key-value store.
///
/// Keeps the whole map in memory and rewrites a snapshot file on every
/// write. Snapshot format: `[key_len:u32 LE][key][value_len:u32 LE][value]...`.
/// A write goes to a temp file first and is renamed into place, so a crash
/// leaves either the old snapshot or the new one.
pub struct FileBackedKVStore {
    inner: InMemoryKVStore,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading an existing snapshot if present.
    ///
    /// A missing file is an empty store; a truncated one is `Corruption`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();
        let data = match std::fs::File::open(&path) {
            Ok(mut file) => {
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).map_err(io_error)?;
                decode_snapshot(&bytes)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[qns] No existing store file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(io_error(e)),
        };
        if !data.is_empty() {
            info!("[qns] Loaded {} keys from {}", data.len(), path.display());
        }
        Ok(Self {
            inner: InMemoryKVStore::from_map(data),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the snapshot is staged in before the rename.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn persist(&self, snapshot: &InMemoryKVStore) -> Result<(), KVStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let mut bytes = Vec::new();
        for (key, value) in snapshot.entries() {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(value);
        }

        let temp_path = self.temp_path();
        let mut file = std::fs::File::create(&temp_path).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_error)?;

        debug!(keys = snapshot.len(), bytes = bytes.len(), "[qns] Store persisted");
        Ok(())
    }

    /// Apply `operations` to a copy, persist it, then swap it in.
    fn write_through(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut next = self.inner.clone();
        next.atomic_batch_write(operations)?;
        self.persist(&next)?;
        self.inner = next;
        Ok(())
    }
}

fn decode_snapshot(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, KVStoreError> {
    let mut data = BTreeMap::new();
    let mut cursor = 0;
    while cursor < bytes.len() {
        let key = read_chunk(bytes, &mut cursor)?;
        let value = read_chunk(bytes, &mut cursor)?;
        data.insert(key, value);
    }
    Ok(data)
}

fn read_chunk(bytes: &[u8], cursor: &mut usize) -> Result<Vec<u8>, KVStoreError> {
    let truncated = || KVStoreError::Corruption {
        message: format!("snapshot truncated at byte {cursor}"),
    };
    let len_end = cursor.checked_add(4).ok_or_else(truncated)?;
    let len_bytes: [u8; 4] = bytes
        .get(*cursor..len_end)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(truncated)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    let end = len_end.checked_add(len).ok_or_else(truncated)?;
    let chunk = bytes.get(len_end..end).ok_or_else(truncated)?.to_vec();
    *cursor = end;
    Ok(chunk)
}

fn io_error(e: std::io::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: e.to_string(),
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.write_through(vec![BatchOperation::put(key, value)])
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.write_through(vec![BatchOperation::delete(key)])
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.write_through(operations)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        self.inner.exists(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        self.inner.prefix_scan(prefix)
    }
}
