//! Local persistence of the task list snapshot and the pending queue.
//!
//! Strict readers distinguish an absent key (`Ok(None)`) from a value that
//! no longer parses ([`StorageError::Corrupt`]). The `_or_empty` readers
//! implement the application policy of treating corrupt data as empty,
//! logging it instead of surfacing it.

use taskpad_proto::codec::{self, CodecError};
use taskpad_proto::{PendingOperation, Task};

use crate::storage::{KeyValueStore, PENDING_KEY, StorageError, TASK_LIST_KEY};

fn corrupt(key: &str, err: CodecError) -> StorageError {
    StorageError::Corrupt {
        key: key.to_string(),
        reason: err.to_string(),
    }
}

fn encode_failed(key: &str, err: CodecError) -> StorageError {
    StorageError::Encode {
        key: key.to_string(),
        reason: err.to_string(),
    }
}

/// Typed access to the `taskList` and `pendingKey` entries.
#[derive(Debug, Clone)]
pub struct SnapshotStore<K> {
    storage: K,
}

impl<K: KeyValueStore> SnapshotStore<K> {
    /// Wrap a key/value store.
    pub const fn new(storage: K) -> Self {
        Self { storage }
    }

    /// The underlying key/value store.
    pub const fn storage(&self) -> &K {
        &self.storage
    }

    /// Read the task list snapshot.
    ///
    /// # Errors
    ///
    /// [`StorageError::Corrupt`] if the stored value does not parse, or the
    /// storage's own error if the read fails.
    pub async fn load_tasks(&self) -> Result<Option<Vec<Task>>, StorageError> {
        let Some(raw) = self.storage.get_item(TASK_LIST_KEY).await? else {
            return Ok(None);
        };
        codec::decode_tasks(&raw)
            .map(Some)
            .map_err(|e| corrupt(TASK_LIST_KEY, e))
    }

    /// Read the task list snapshot, treating absent or corrupt data as empty.
    ///
    /// # Errors
    ///
    /// Only if the storage read itself fails.
    pub async fn load_tasks_or_empty(&self) -> Result<Vec<Task>, StorageError> {
        or_empty(self.load_tasks().await)
    }

    /// Overwrite the task list snapshot.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the write fails.
    pub async fn save_tasks(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let encoded = codec::encode_tasks(tasks).map_err(|e| encode_failed(TASK_LIST_KEY, e))?;
        self.storage.set_item(TASK_LIST_KEY, encoded).await
    }

    /// Read the pending queue, newest first.
    ///
    /// # Errors
    ///
    /// [`StorageError::Corrupt`] if the stored value does not parse, or the
    /// storage's own error if the read fails.
    pub async fn load_queue(&self) -> Result<Option<Vec<PendingOperation>>, StorageError> {
        let Some(raw) = self.storage.get_item(PENDING_KEY).await? else {
            return Ok(None);
        };
        codec::decode_queue(&raw)
            .map(Some)
            .map_err(|e| corrupt(PENDING_KEY, e))
    }

    /// Read the pending queue, treating absent or corrupt data as empty.
    ///
    /// # Errors
    ///
    /// Only if the storage read itself fails.
    pub async fn load_queue_or_empty(&self) -> Result<Vec<PendingOperation>, StorageError> {
        or_empty(self.load_queue().await)
    }

    /// Overwrite the pending queue.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the write fails.
    pub async fn save_queue(&self, queue: &[PendingOperation]) -> Result<(), StorageError> {
        let encoded = codec::encode_queue(queue).map_err(|e| encode_failed(PENDING_KEY, e))?;
        self.storage.set_item(PENDING_KEY, encoded).await
    }

    /// Remove the pending queue entirely.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the removal fails.
    pub async fn clear_queue(&self) -> Result<(), StorageError> {
        self.storage.remove_item(PENDING_KEY).await
    }
}

fn or_empty<T>(loaded: Result<Option<Vec<T>>, StorageError>) -> Result<Vec<T>, StorageError> {
    match loaded {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(StorageError::Corrupt { key, reason }) => {
            tracing::warn!(key = %key, reason = %reason, "corrupt local data treated as empty");
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}
