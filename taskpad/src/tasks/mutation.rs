//! The four task mutations and id generation.
//!
//! Each mutation computes the optimistic list, picks a route, performs the
//! remote call or enqueues the operation, and then overwrites the snapshot.
//! On the direct path a remote failure returns before the snapshot write,
//! so the stored snapshot still holds the previous list.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use taskpad_proto::{NewTask, PendingOperation, Task, TaskId, TaskPatch};

use super::sync::TaskSync;
use super::{Route, SyncError, ops};
use crate::connectivity::Connectivity;
use crate::remote::RemoteTaskStore;
use crate::session::SecureStore;
use crate::storage::KeyValueStore;

/// Issues task ids from the wall clock.
///
/// Ids are milliseconds since the Unix epoch. Within one generator they
/// strictly increase, even if the clock stalls or steps backwards.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: Mutex<u64>,
}

impl IdGenerator {
    /// A generator with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current timestamp in milliseconds since epoch.
    fn now_ms() -> u64 {
        u64::try_from(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
        )
        .unwrap_or(u64::MAX)
    }

    /// The next id.
    pub fn next_id(&self) -> TaskId {
        self.next_after(Self::now_ms())
    }

    fn next_after(&self, now: u64) -> TaskId {
        let mut last = self.last.lock();
        let id = now.max(last.saturating_add(1));
        *last = id;
        TaskId::from_millis(id)
    }
}

/// Outcome of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation<T> {
    /// What the mutation produced: the written task, or the deleted id.
    pub value: T,
    /// The list after the mutation, already written to the snapshot.
    pub tasks: Vec<Task>,
    /// Whether the change went to the remote store or the queue.
    pub route: Route,
}

impl<K, R, C, S> TaskSync<K, R, C, S>
where
    K: KeyValueStore,
    R: RemoteTaskStore,
    C: Connectivity,
    S: SecureStore,
{
    /// Create a task from `draft` and put it at the front of `tasks`.
    ///
    /// # Errors
    ///
    /// [`SyncError::Remote`] if the direct write fails, or
    /// [`SyncError::Storage`] if the queue or snapshot write fails.
    pub async fn add(&self, tasks: &[Task], draft: NewTask) -> Result<Mutation<Task>, SyncError> {
        let task = draft.into_task(self.ids.next_id());
        let next = ops::prepend(tasks, task.clone());
        let route = self
            .write(PendingOperation::Add { task: task.clone() }, &next)
            .await?;
        Ok(Mutation {
            value: task,
            tasks: next,
            route,
        })
    }

    /// Replace the task with `task.id` by `task`.
    ///
    /// The remote update and queue entry are issued even if `task.id` is
    /// not in `tasks`.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub async fn update(&self, tasks: &[Task], task: Task) -> Result<Mutation<Task>, SyncError> {
        let next = ops::replace(tasks, &task);
        let route = self
            .write(PendingOperation::Update { task: task.clone() }, &next)
            .await?;
        Ok(Mutation {
            value: task,
            tasks: next,
            route,
        })
    }

    /// Apply `patch` to the task with `id` and update it. Returns `None`
    /// without touching anything if `id` is not in `tasks`.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub async fn edit(
        &self,
        tasks: &[Task],
        id: &TaskId,
        patch: TaskPatch,
    ) -> Result<Option<Mutation<Task>>, SyncError> {
        let Some(current) = ops::find(tasks, id) else {
            tracing::debug!(task_id = %id, "edit of unknown task ignored");
            return Ok(None);
        };
        let mut task = current.clone();
        task.apply(patch);
        self.update(tasks, task).await.map(Some)
    }

    /// Remove the task with `id`.
    ///
    /// An id absent from `tasks` leaves the list unchanged but the delete
    /// is still sent or queued.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub async fn delete(&self, tasks: &[Task], id: &TaskId) -> Result<Mutation<TaskId>, SyncError> {
        let next = ops::remove(tasks, id);
        let route = self
            .write(PendingOperation::Delete { id: id.clone() }, &next)
            .await?;
        Ok(Mutation {
            value: id.clone(),
            tasks: next,
            route,
        })
    }

    /// Mark the task with `id` as `Completed`. Returns `None` without
    /// touching anything if `id` is not in `tasks`.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub async fn complete(
        &self,
        tasks: &[Task],
        id: &TaskId,
    ) -> Result<Option<Mutation<Task>>, SyncError> {
        let Some(current) = ops::find(tasks, id) else {
            tracing::debug!(task_id = %id, "complete of unknown task ignored");
            return Ok(None);
        };
        let task = current.completed();
        self.update(tasks, task).await.map(Some)
    }

    async fn write(&self, op: PendingOperation, next: &[Task]) -> Result<Route, SyncError> {
        let route = if let Some(uid) = self.direct_route().await {
            if let Err(err) = self.send(&uid, &op).await {
                tracing::warn!(
                    kind = op.kind(),
                    task_id = %op.task_id(),
                    error = %err,
                    "direct write failed"
                );
                return Err(err.into());
            }
            Route::Direct
        } else {
            self.enqueue(op).await?;
            Route::Queued
        };
        self.snapshot.save_tasks(next).await?;
        tracing::debug!(%route, count = next.len(), "snapshot written");
        Ok(route)
    }
}
