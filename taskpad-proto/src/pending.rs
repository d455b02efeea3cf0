//! Queued task mutations awaiting replay against the backend.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId};

/// A task mutation recorded while offline (or signed out).
///
/// Serialized with an internal `type` tag so that the stored queue reads as
/// `[{"type":"update","task":{..}},{"type":"delete","id":".."}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PendingOperation {
    /// Create the task document.
    Add {
        /// The full task as created locally.
        task: Task,
    },
    /// Merge the task fields into the existing document.
    Update {
        /// The full task after the local edit.
        task: Task,
    },
    /// Remove the task document.
    Delete {
        /// Identifier of the removed task.
        id: TaskId,
    },
}

impl PendingOperation {
    /// The task this operation targets.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        match self {
            Self::Add { task } | Self::Update { task } => &task.id,
            Self::Delete { id } => id,
        }
    }

    /// Returns `true` for [`PendingOperation::Delete`].
    #[must_use]
    pub const fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }

    /// Short lowercase name of the operation kind, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}
