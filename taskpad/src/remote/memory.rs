//! In-memory remote store for testing.
//!
//! Records every call so tests can assert what reached the "backend", and
//! can be told to fail upcoming calls to exercise error paths.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use taskpad_proto::{Task, TaskId, UserId};

use super::{RemoteError, RemoteTaskStore};

/// A call observed by [`MemoryRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `create(uid, task)`
    Create(UserId, Task),
    /// `update(uid, task)`
    Update(UserId, Task),
    /// `delete(uid, id)`
    Delete(UserId, TaskId),
    /// `list(uid)`
    List(UserId),
    /// `batch_write(uid, tasks)`
    BatchWrite(UserId, Vec<Task>),
}

#[derive(Debug, Default)]
struct Inner {
    docs: HashMap<UserId, BTreeMap<TaskId, Task>>,
    calls: Vec<RemoteCall>,
    failures: VecDeque<Option<RemoteError>>,
}

impl Inner {
    fn take_failure(&mut self) -> Result<(), RemoteError> {
        self.failures.pop_front().flatten().map_or(Ok(()), Err)
    }
}

/// In-process [`RemoteTaskStore`]. Clones share the same documents.
///
/// Documents are kept per user in id order, so `list` is deterministic.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRemote {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document directly, without recording a call.
    pub fn insert(&self, uid: &UserId, task: Task) {
        self.inner
            .lock()
            .docs
            .entry(uid.clone())
            .or_default()
            .insert(task.id.clone(), task);
    }

    /// Current documents for `uid`, in id order.
    #[must_use]
    pub fn tasks(&self, uid: &UserId) -> Vec<Task> {
        self.inner
            .lock()
            .docs
            .get(uid)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every call received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.inner.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Make the next call fail with `error`. Failures queue up and are
    /// consumed one per call, in order.
    pub fn fail_next(&self, error: RemoteError) {
        self.inner.lock().failures.push_back(Some(error));
    }

    /// Let the next `calls` calls through, then fail one with `error`.
    pub fn fail_after(&self, calls: usize, error: RemoteError) {
        let mut inner = self.inner.lock();
        inner.failures.extend(std::iter::repeat_n(None, calls));
        inner.failures.push_back(Some(error));
    }
}

impl RemoteTaskStore for MemoryRemote {
    async fn create(&self, uid: &UserId, task: &Task) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::Create(uid.clone(), task.clone()));
        inner.take_failure()?;
        inner
            .docs
            .entry(uid.clone())
            .or_default()
            .insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn update(&self, uid: &UserId, task: &Task) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::Update(uid.clone(), task.clone()));
        inner.take_failure()?;
        let doc = inner
            .docs
            .get_mut(uid)
            .and_then(|docs| docs.get_mut(&task.id))
            .ok_or_else(|| RemoteError::NotFound(task.id.clone()))?;
        *doc = task.clone();
        Ok(())
    }

    async fn delete(&self, uid: &UserId, id: &TaskId) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::Delete(uid.clone(), id.clone()));
        inner.take_failure()?;
        if let Some(docs) = inner.docs.get_mut(uid) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(&self, uid: &UserId) -> Result<Vec<Task>, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::List(uid.clone()));
        inner.take_failure()?;
        Ok(inner
            .docs
            .get(uid)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn batch_write(&self, uid: &UserId, tasks: &[Task]) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push(RemoteCall::BatchWrite(uid.clone(), tasks.to_vec()));
        inner.take_failure()?;
        let docs = inner.docs.entry(uid.clone()).or_default();
        for task in tasks {
            docs.insert(task.id.clone(), task.clone());
        }
        Ok(())
    }
}
