//! The sync engine: route decisions, loading, and queue drain.

use taskpad_proto::{PendingOperation, Task, UserId};

use super::mutation::IdGenerator;
use super::queue::{PendingQueue, QueuePolicy};
use super::snapshot::SnapshotStore;
use super::SyncError;
use crate::connectivity::Connectivity;
use crate::remote::{RemoteError, RemoteTaskStore};
use crate::session::{SecureStore, SessionStore};
use crate::storage::KeyValueStore;

/// Owns every collaborator a load or mutation needs.
///
/// `TaskSync` holds no task list of its own. Callers pass the current list
/// in and receive the next one back (see [`TaskBoard`](super::TaskBoard)).
/// Operations are not mutually exclusive: two concurrent mutations race on
/// the stored queue and snapshot, and the last writer wins.
pub struct TaskSync<K, R, C, S> {
    pub(super) snapshot: SnapshotStore<K>,
    pub(super) remote: R,
    pub(super) connectivity: C,
    pub(super) session: SessionStore<S>,
    pub(super) policy: QueuePolicy,
    pub(super) ids: IdGenerator,
}

impl<K, R, C, S> TaskSync<K, R, C, S>
where
    K: KeyValueStore,
    R: RemoteTaskStore,
    C: Connectivity,
    S: SecureStore,
{
    /// Assemble the engine with the default queue policy.
    pub fn new(storage: K, remote: R, connectivity: C, session: SessionStore<S>) -> Self {
        Self {
            snapshot: SnapshotStore::new(storage),
            remote,
            connectivity,
            session,
            policy: QueuePolicy::default(),
            ids: IdGenerator::new(),
        }
    }

    /// Replace the queue policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: QueuePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Local snapshot and queue storage.
    pub const fn snapshot(&self) -> &SnapshotStore<K> {
        &self.snapshot
    }

    /// The remote task store.
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// The connectivity oracle.
    pub const fn connectivity(&self) -> &C {
        &self.connectivity
    }

    /// The session store.
    pub const fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    /// The active queue policy.
    pub const fn policy(&self) -> QueuePolicy {
        self.policy
    }

    /// The user to write through for, if the direct path applies right now.
    ///
    /// The direct path needs both connectivity and a session.
    pub async fn direct_route(&self) -> Option<UserId> {
        if !self.connectivity.is_online().await {
            tracing::debug!("offline, using queued path");
            return None;
        }
        let uid = self.session.get_session().await;
        if uid.is_none() {
            tracing::debug!("no session, using queued path");
        }
        uid
    }

    /// Produce the current task list.
    ///
    /// Online with a session: drain the pending queue, fetch the remote
    /// list, and overwrite the snapshot with it. Otherwise: the local
    /// snapshot, with absent or corrupt data read as empty.
    ///
    /// # Errors
    ///
    /// [`SyncError::Replay`] if a queued operation fails (the queue is left
    /// as it was), [`SyncError::Remote`] if the fetch fails, or
    /// [`SyncError::Storage`] on local storage failure.
    pub async fn load(&self) -> Result<Vec<Task>, SyncError> {
        let Some(uid) = self.direct_route().await else {
            let tasks = self.snapshot.load_tasks_or_empty().await?;
            tracing::debug!(count = tasks.len(), "loaded local snapshot");
            return Ok(tasks);
        };

        self.drain(&uid).await?;

        let tasks = self.remote.list(&uid).await?;
        self.snapshot.save_tasks(&tasks).await?;
        tracing::info!(uid = %uid, count = tasks.len(), "loaded remote task list");
        Ok(tasks)
    }

    /// Replay every queued operation for `uid` in stored order, then clear
    /// the queue. Returns the number of operations replayed.
    ///
    /// # Errors
    ///
    /// Stops at the first failing operation with [`SyncError::Replay`] and
    /// leaves the stored queue untouched.
    pub async fn drain(&self, uid: &UserId) -> Result<usize, SyncError> {
        let queue = self.snapshot.load_queue_or_empty().await?;
        if queue.is_empty() {
            return Ok(0);
        }

        tracing::info!(uid = %uid, count = queue.len(), "draining pending queue");
        for (index, op) in queue.iter().enumerate() {
            if let Err(source) = self.send(uid, op).await {
                tracing::warn!(
                    index,
                    kind = op.kind(),
                    task_id = %op.task_id(),
                    error = %source,
                    "replay failed, queue kept"
                );
                return Err(SyncError::Replay {
                    index,
                    kind: op.kind(),
                    id: op.task_id().clone(),
                    source,
                });
            }
        }

        self.snapshot.clear_queue().await?;
        tracing::info!(uid = %uid, count = queue.len(), "pending queue drained");
        Ok(queue.len())
    }

    /// Upload the whole local snapshot in one batch write. Returns the
    /// number of tasks written.
    ///
    /// # Errors
    ///
    /// [`SyncError::Offline`] or [`SyncError::NotSignedIn`] when the direct
    /// path is unavailable, otherwise the storage or remote failure.
    pub async fn push_snapshot(&self) -> Result<usize, SyncError> {
        if !self.connectivity.is_online().await {
            return Err(SyncError::Offline);
        }
        let uid = self
            .session
            .get_session()
            .await
            .ok_or(SyncError::NotSignedIn)?;

        let tasks = self.snapshot.load_tasks_or_empty().await?;
        self.remote.batch_write(&uid, &tasks).await?;
        tracing::info!(uid = %uid, count = tasks.len(), "snapshot pushed");
        Ok(tasks.len())
    }

    /// The stored pending queue, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] if the read fails.
    pub async fn pending(&self) -> Result<PendingQueue, SyncError> {
        Ok(PendingQueue::from(self.snapshot.load_queue_or_empty().await?))
    }

    /// Perform `op` against the remote store.
    ///
    /// An update whose document is missing is written as a create. A
    /// queued update may stand in for an add that was coalesced away
    /// before it ever reached the remote store.
    pub(super) async fn send(&self, uid: &UserId, op: &PendingOperation) -> Result<(), RemoteError> {
        match op {
            PendingOperation::Add { task } => self.remote.create(uid, task).await,
            PendingOperation::Update { task } => match self.remote.update(uid, task).await {
                Err(RemoteError::NotFound(_)) => {
                    tracing::debug!(uid = %uid, task_id = %task.id, "update target missing, creating");
                    self.remote.create(uid, task).await
                }
                other => other,
            },
            PendingOperation::Delete { id } => self.remote.delete(uid, id).await,
        }
    }

    /// Record `op` in the stored queue.
    pub(super) async fn enqueue(&self, op: PendingOperation) -> Result<(), SyncError> {
        let mut queue = PendingQueue::from(self.snapshot.load_queue_or_empty().await?);
        let kind = op.kind();
        let id = op.task_id().clone();
        let queued = queue.push(op, self.policy);
        self.snapshot.save_queue(queue.as_slice()).await?;
        tracing::info!(kind, task_id = %id, queued, depth = queue.len(), "operation queued");
        Ok(())
    }
}
