//! Unstructured local key/value storage.
//!
//! Defines the [`KeyValueStore`] trait used for everything `Taskpad` keeps on
//! the device: the cached user profile, the task list snapshot, and the
//! pending operation queue. Values are opaque strings (JSON in practice).
//!
//! Implementations:
//! - [`memory::MemoryStorage`]: in-process map, shared between clones
//! - [`file::FileStorage`]: one file per key under a data directory

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Key holding the serialized [`UserProfile`](taskpad_proto::UserProfile) of
/// the signed-in user.
pub const USER_DETAILS_KEY: &str = "userDetails";

/// Key holding the serialized task list snapshot.
pub const TASK_LIST_KEY: &str = "taskList";

/// Key holding the serialized pending operation queue.
pub const PENDING_KEY: &str = "pendingKey";

/// Errors that can occur while reading or writing local storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The underlying medium failed.
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        /// Key being accessed.
        key: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A value is present but cannot be parsed as the expected type.
    #[error("stored value for key {key} is corrupt: {reason}")]
    Corrupt {
        /// Key whose value failed to parse.
        key: String,
        /// Parser error text.
        reason: String,
    },

    /// A value could not be serialized before writing.
    #[error("failed to encode value for key {key}: {reason}")]
    Encode {
        /// Key being written.
        key: String,
        /// Serializer error text.
        reason: String,
    },

    /// The key cannot be mapped onto the storage medium.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Async string key/value storage.
///
/// Reads of a key that was never written (or was removed) return
/// `Ok(None)`. Removing a missing key is not an error.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get_item(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(
        &self,
        key: &str,
        value: String,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Delete the value stored under `key`.
    fn remove_item(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}
