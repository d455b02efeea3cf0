//! In-memory key/value storage for tests and embedding.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{KeyValueStore, StorageError};

/// In-process [`KeyValueStore`] backed by a `HashMap`.
///
/// Clones share the same map, so a test can hand one clone to the sync
/// engine and inspect the other. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of the value under `key` without going through the
    /// async trait.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    /// Write a raw value, bypassing encoding. Useful for seeding corrupt data.
    pub fn put_raw(&self, key: &str, value: impl Into<String>) {
        self.items.lock().insert(key.to_string(), value.into());
    }
}

impl KeyValueStore for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.items.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.lock().remove(key);
        Ok(())
    }
}
