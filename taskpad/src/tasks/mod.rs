//! Offline-first task list synchronization for `Taskpad`.
//!
//! Every mutation either writes straight through to the remote store
//! (online and signed in) or is recorded in a local pending queue for later
//! replay. Both paths overwrite the local snapshot so the visible list is
//! always the optimistic one. The queue is drained on the next online load.

pub mod board;
pub mod mutation;
pub mod ops;
pub mod queue;
pub mod snapshot;
pub mod sync;

pub use board::TaskBoard;
pub use mutation::{IdGenerator, Mutation};
pub use queue::{PendingQueue, QueuePolicy};
pub use snapshot::SnapshotStore;
pub use sync::TaskSync;

use std::fmt;

use taskpad_proto::TaskId;

use crate::remote::RemoteError;
use crate::storage::StorageError;

/// Which way a mutation went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Written to the remote store immediately.
    Direct,
    /// Recorded in the pending queue for the next drain.
    Queued,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Queued => write!(f, "queued"),
        }
    }
}

/// Errors that can occur while loading or mutating tasks.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Local storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A direct-path remote call or the post-drain fetch failed.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Replaying a queued operation failed; the queue was left intact.
    #[error("replay of queued {kind} for task {id} failed at position {index}: {source}")]
    Replay {
        /// Position of the failing operation in the stored queue.
        index: usize,
        /// Operation kind (`add`, `update`, `delete`).
        kind: &'static str,
        /// Task the operation targeted.
        id: TaskId,
        /// Underlying remote failure.
        source: RemoteError,
    },

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// The operation needs connectivity.
    #[error("offline")]
    Offline,
}
