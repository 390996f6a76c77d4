//! In-process bitfield store with Redis string semantics.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{BitfieldStore, StoreError};
use crate::codec::{read_field, write_field, FieldDescriptor};

/// Thread-safe in-memory store keyed by string.
///
/// A field set takes the write lock for the whole read-modify-write, which
/// gives the per-field atomicity the canvas relies on. Reads take the read
/// lock and copy the requested range out.
pub struct MemoryStore {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (key_count, byte_count) = self
            .values
            .read()
            .map(|v| (v.len(), v.values().map(Vec::len).sum::<usize>()))
            .unwrap_or((0, 0));
        f.debug_struct("MemoryStore")
            .field("key_count", &key_count)
            .field("byte_count", &byte_count)
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the value under `key`, zero when absent.
    pub fn len(&self, key: &str) -> Result<usize, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned("MemoryStore"))?;
        Ok(values.get(key).map_or(0, Vec::len))
    }
}

impl BitfieldStore for MemoryStore {
    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned("MemoryStore"))?;
        values.remove(key);
        Ok(())
    }

    fn set_field(&self, key: &str, field: FieldDescriptor, value: u16) -> Result<u16, StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned("MemoryStore"))?;
        let bytes = values.entry(key.to_string()).or_default();
        let previous = read_field(bytes, field);
        write_field(bytes, field, value);
        Ok(previous)
    }

    fn get_range(&self, key: &str, start: u64, end: u64) -> Result<Vec<u8>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned("MemoryStore"))?;
        let Some(bytes) = values.get(key) else {
            return Ok(Vec::new());
        };
        if bytes.is_empty() || start > end || start >= bytes.len() as u64 {
            return Ok(Vec::new());
        }
        let last = end.min(bytes.len() as u64 - 1);
        Ok(bytes[start as usize..=last as usize].to_vec())
    }

    fn replace(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned("MemoryStore"))?;
        values.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned("MemoryStore"))?;
        Ok(values.contains_key(key))
    }
}
