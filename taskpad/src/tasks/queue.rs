//! The pending operation queue and its coalescing rule.
//!
//! The queue is newest-first: each new operation is inserted at the head.
//! Before inserting an operation for task `X`, every queued add or update
//! for `X` is dropped, so at most one non-delete entry exists per task.
//! Queued deletes are never dropped by a later insert; they leave the queue
//! only when a drain clears it.

use taskpad_proto::{PendingOperation, TaskId};

/// Tunables for [`PendingQueue::push`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueuePolicy {
    /// When a delete for `X` drops a queued add for `X`, skip queuing the
    /// delete as well: the task never reached the backend, so there is
    /// nothing to remove there.
    ///
    /// Off by default, in which case the delete is queued and replayed
    /// against a document that was never created.
    pub elide_unsynced_deletes: bool,
}

/// Ordered, newest-first list of operations awaiting replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingQueue {
    ops: Vec<PendingOperation>,
}

impl PendingQueue {
    /// An empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Insert `op` at the head after coalescing.
    ///
    /// Returns `false` if the policy elided the operation entirely.
    pub fn push(&mut self, op: PendingOperation, policy: QueuePolicy) -> bool {
        let id = op.task_id().clone();
        let removed_add = self.drop_unsynced(&id);

        if op.is_delete() && removed_add && policy.elide_unsynced_deletes {
            tracing::debug!(task_id = %id, "delete of never-synced task elided");
            return false;
        }

        self.ops.insert(0, op);
        true
    }

    /// Remove queued adds and updates for `id`. Returns `true` if one of
    /// them was an add.
    fn drop_unsynced(&mut self, id: &TaskId) -> bool {
        let mut removed_add = false;
        self.ops.retain(|queued| {
            let superseded = !queued.is_delete() && queued.task_id() == id;
            if superseded && matches!(queued, PendingOperation::Add { .. }) {
                removed_add = true;
            }
            !superseded
        });
        removed_add
    }

    /// Operations in stored (newest-first) order.
    #[must_use]
    pub fn as_slice(&self) -> &[PendingOperation] {
        &self.ops
    }

    /// Number of queued operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate in stored order.
    pub fn iter(&self) -> std::slice::Iter<'_, PendingOperation> {
        self.ops.iter()
    }

    /// Take the operations out.
    #[must_use]
    pub fn into_vec(self) -> Vec<PendingOperation> {
        self.ops
    }
}

impl From<Vec<PendingOperation>> for PendingQueue {
    fn from(ops: Vec<PendingOperation>) -> Self {
        Self { ops }
    }
}

impl<'a> IntoIterator for &'a PendingQueue {
    type Item = &'a PendingOperation;
    type IntoIter = std::slice::Iter<'a, PendingOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
