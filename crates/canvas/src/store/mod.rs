//! The external bitfield store seam
//!
//! The packed buffer lives under a single key in an ordered, byte-addressable
//! store. The store is the only point of mutual exclusion: a single
//! [`BitfieldStore::set_field`] must be atomic with respect to other field
//! sets on the same key. Nothing here serializes requests on the client side.

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

use thiserror::Error;

use crate::codec::FieldDescriptor;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Store state poisoned: {0}")]
    Poisoned(&'static str),

    #[error("Unexpected response from {command}: {detail}")]
    UnexpectedResponse {
        command: &'static str,
        detail: String,
    },

    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Operations the canvas needs from its backing store
pub trait BitfieldStore: Send + Sync {
    /// Remove the key. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Atomically set one unsigned field, creating the key (zero-filled) when
    /// absent. Returns the field's previous value.
    fn set_field(&self, key: &str, field: FieldDescriptor, value: u16) -> Result<u16, StoreError>;

    /// Bytes `start..=end` of the key's value, clamped to its length. An
    /// absent key or an empty intersection yields no bytes.
    fn get_range(&self, key: &str, start: u64, end: u64) -> Result<Vec<u8>, StoreError>;

    /// Overwrite the whole value in one operation
    fn replace(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Whether the key currently holds a value
    fn exists(&self, key: &str) -> Result<bool, StoreError>;
}
