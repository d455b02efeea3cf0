//! Remote task document store.
//!
//! Defines the [`RemoteTaskStore`] trait: per-user task documents keyed by
//! task id. Concrete implementations:
//! - [`memory::MemoryRemote`]: in-process store with call recording and
//!   failure injection, for tests
//! - [`http::HttpBackend`]: JSON over HTTP against `taskpad-server`

pub mod http;
pub mod memory;

pub use http::HttpBackend;
pub use memory::{MemoryRemote, RemoteCall};

use taskpad_proto::{Task, TaskId, UserId};

/// Errors returned by a remote task store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// An update targeted a document that does not exist.
    #[error("task {0} not found in remote store")]
    NotFound(TaskId),

    /// The backend answered with a non-success status.
    #[error("remote store returned {status} ({code}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Backend error code, empty if none was sent.
        code: String,
        /// Backend error message.
        message: String,
    },

    /// The request never completed (connect failure, reset, timeout).
    #[error("remote store unreachable: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("invalid response from remote store: {0}")]
    Decode(String),
}

/// Async per-user task document store.
///
/// # Contract
///
/// - `create` is an upsert by task id.
/// - `update` merges fields into an existing document and fails with
///   [`RemoteError::NotFound`] if it is absent.
/// - `delete` succeeds whether or not the document exists.
/// - `list` returns every document for the user in unspecified order.
/// - `batch_write` upserts every task in one request.
pub trait RemoteTaskStore: Send + Sync {
    /// Create or overwrite the document for `task`.
    fn create(
        &self,
        uid: &UserId,
        task: &Task,
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;

    /// Merge `task` into its existing document.
    fn update(
        &self,
        uid: &UserId,
        task: &Task,
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;

    /// Remove the document for `id`.
    fn delete(
        &self,
        uid: &UserId,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;

    /// Fetch every task document for `uid`.
    fn list(
        &self,
        uid: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, RemoteError>> + Send;

    /// Upsert all of `tasks` at once.
    fn batch_write(
        &self,
        uid: &UserId,
        tasks: &[Task],
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;
}
