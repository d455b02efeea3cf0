//! Caller-owned task list state.

use taskpad_proto::{NewTask, Task, TaskId, TaskPatch};

use super::sync::TaskSync;
use super::{SyncError, ops};
use crate::connectivity::Connectivity;
use crate::remote::RemoteTaskStore;
use crate::session::SecureStore;
use crate::storage::KeyValueStore;

/// The visible task list and its loading flag.
///
/// A mutation's list is committed only when the mutation succeeds. If a
/// direct-path write fails the board keeps the list it had before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    loading: bool,
}

impl TaskBoard {
    /// An empty, idle board.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            loading: false,
        }
    }

    /// A board showing `tasks`.
    #[must_use]
    pub const fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            loading: false,
        }
    }

    /// Current tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns `true` while a refresh is in progress.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// The task with `id`, if shown.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        ops::find(&self.tasks, id)
    }

    /// Tasks whose status text equals `status`.
    pub fn with_status<'a>(&'a self, status: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks
            .iter()
            .filter(move |t| t.status.as_str() == status)
    }

    /// Reload from `sync`. Returns `false` if the load failed, in which
    /// case the failure is logged and the current list kept.
    pub async fn refresh<K, R, C, S>(&mut self, sync: &TaskSync<K, R, C, S>) -> bool
    where
        K: KeyValueStore,
        R: RemoteTaskStore,
        C: Connectivity,
        S: SecureStore,
    {
        self.loading = true;
        let result = sync.load().await;
        self.loading = false;
        match result {
            Ok(tasks) => {
                self.tasks = tasks;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "task list refresh failed");
                false
            }
        }
    }

    /// A board loaded from `sync`, or from the local snapshot if the load
    /// fails. The flag is `false` when the snapshot fallback was used.
    ///
    /// # Errors
    ///
    /// [`SyncError::Storage`] if the fallback snapshot read fails.
    pub async fn open<K, R, C, S>(sync: &TaskSync<K, R, C, S>) -> Result<(Self, bool), SyncError>
    where
        K: KeyValueStore,
        R: RemoteTaskStore,
        C: Connectivity,
        S: SecureStore,
    {
        let mut board = Self::new();
        if board.refresh(sync).await {
            return Ok((board, true));
        }
        let tasks = sync.snapshot().load_tasks_or_empty().await?;
        Ok((Self::with_tasks(tasks), false))
    }

    /// Add a task.
    ///
    /// # Errors
    ///
    /// Propagates the [`SyncError`]; the board is unchanged.
    pub async fn add<K, R, C, S>(
        &mut self,
        sync: &TaskSync<K, R, C, S>,
        draft: NewTask,
    ) -> Result<Task, SyncError>
    where
        K: KeyValueStore,
        R: RemoteTaskStore,
        C: Connectivity,
        S: SecureStore,
    {
        let m = sync.add(&self.tasks, draft).await?;
        self.tasks = m.tasks;
        Ok(m.value)
    }

    /// Replace a task.
    ///
    /// # Errors
    ///
    /// Propagates the [`SyncError`]; the board is unchanged.
    pub async fn update<K, R, C, S>(
        &mut self,
        sync: &TaskSync<K, R, C, S>,
        task: Task,
    ) -> Result<Task, SyncError>
    where
        K: KeyValueStore,
        R: RemoteTaskStore,
        C: Connectivity,
        S: SecureStore,
    {
        let m = sync.update(&self.tasks, task).await?;
        self.tasks = m.tasks;
        Ok(m.value)
    }

    /// Patch a task. `Ok(None)` if `id` is not shown.
    ///
    /// # Errors
    ///
    /// Propagates the [`SyncError`]; the board is unchanged.
    pub async fn edit<K, R, C, S>(
        &mut self,
        sync: &TaskSync<K, R, C, S>,
        id: &TaskId,
        patch: TaskPatch,
    ) -> Result<Option<Task>, SyncError>
    where
        K: KeyValueStore,
        R: RemoteTaskStore,
        C: Connectivity,
        S: SecureStore,
    {
        let Some(m) = sync.edit(&self.tasks, id, patch).await? else {
            return Ok(None);
        };
        self.tasks = m.tasks;
        Ok(Some(m.value))
    }

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// Propagates the [`SyncError`]; the board is unchanged.
    pub async fn delete<K, R, C, S>(
        &mut self,
        sync: &TaskSync<K, R, C, S>,
        id: &TaskId,
    ) -> Result<(), SyncError>
    where
        K: KeyValueStore,
        R: RemoteTaskStore,
        C: Connectivity,
        S: SecureStore,
    {
        let m = sync.delete(&self.tasks, id).await?;
        self.tasks = m.tasks;
        Ok(())
    }

    /// Complete a task. `Ok(None)` if `id` is not shown.
    ///
    /// # Errors
    ///
    /// Propagates the [`SyncError`]; the board is unchanged.
    pub async fn complete<K, R, C, S>(
        &mut self,
        sync: &TaskSync<K, R, C, S>,
        id: &TaskId,
    ) -> Result<Option<Task>, SyncError>
    where
        K: KeyValueStore,
        R: RemoteTaskStore,
        C: Connectivity,
        S: SecureStore,
    {
        let Some(m) = sync.complete(&self.tasks, id).await? else {
            return Ok(None);
        };
        self.tasks = m.tasks;
        Ok(Some(m.value))
    }
}
