//! JSON encoding for the task list snapshot and the pending queue.
//!
//! Both are stored as JSON arrays under fixed keys in local storage, and the
//! task list is also the body exchanged with the backend.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::pending::PendingOperation;
use crate::task::Task;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The stored text is not valid for the expected type.
    #[error("corrupt data: {0}")]
    Corrupt(String),
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(|e| CodecError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Corrupt(e.to_string()))
}

/// Encodes a task list, preserving order.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if a task cannot be serialized.
pub fn encode_tasks(tasks: &[Task]) -> Result<String, CodecError> {
    encode(tasks)
}

/// Decodes a task list previously written by [`encode_tasks`].
///
/// # Errors
///
/// Returns `CodecError::Corrupt` if the text is not a JSON array of tasks.
pub fn decode_tasks(text: &str) -> Result<Vec<Task>, CodecError> {
    decode(text)
}

/// Encodes the pending queue, preserving order.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if an operation cannot be serialized.
pub fn encode_queue(queue: &[PendingOperation]) -> Result<String, CodecError> {
    encode(queue)
}

/// Decodes a pending queue previously written by [`encode_queue`].
///
/// # Errors
///
/// Returns `CodecError::Corrupt` if the text is not a JSON array of
/// tagged operations.
pub fn decode_queue(text: &str) -> Result<Vec<PendingOperation>, CodecError> {
    decode(text)
}
