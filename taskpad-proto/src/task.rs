//! Task data model shared by the client, the backend, and local storage.
//!
//! A [`Task`] is a flat document: every field is a string so that the JSON
//! written to local storage and the JSON exchanged with the backend are the
//! same shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque task identifier.
///
/// Fresh ids are the creation time in milliseconds since the Unix epoch,
/// rendered in decimal, but callers must not rely on that: ids read back
/// from storage or the backend are arbitrary strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds an identifier from a creation timestamp in milliseconds.
    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self(millis.to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Free-text task status.
///
/// The application uses three well-known values (see the associated
/// constants) but any string round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStatus(String);

impl TaskStatus {
    /// Status of a freshly created task.
    pub const PENDING: &'static str = "Pending";
    /// Status of a task that has been started.
    pub const IN_PROGRESS: &'static str = "In Progress";
    /// Status set by `complete`.
    pub const COMPLETED: &'static str = "Completed";

    /// Wraps an arbitrary status string.
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// The `Pending` status.
    #[must_use]
    pub fn pending() -> Self {
        Self(Self::PENDING.to_string())
    }

    /// The `In Progress` status.
    #[must_use]
    pub fn in_progress() -> Self {
        Self(Self::IN_PROGRESS.to_string())
    }

    /// The `Completed` status.
    #[must_use]
    pub fn completed() -> Self {
        Self(Self::COMPLETED.to_string())
    }

    /// Returns the status text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the status is exactly `Completed`.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.0 == Self::COMPLETED
    }

    /// Returns `true` if the status text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::pending()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single to-do item.
///
/// Only `id` is required when reading. Missing text fields read as empty
/// and a missing status reads as `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned at creation.
    pub id: TaskId,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// Longer free-form description.
    #[serde(default)]
    pub description: String,
    /// Due date as an ISO-8601 timestamp string (may be empty).
    #[serde(default)]
    pub date: String,
    /// Free-text status.
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    /// Returns a copy of this task with the status forced to `Completed`.
    #[must_use]
    pub fn completed(&self) -> Self {
        Self {
            status: TaskStatus::completed(),
            ..self.clone()
        }
    }

    /// Applies every field present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// The user-supplied part of a task, before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Short title.
    pub title: String,
    /// Longer free-form description.
    #[serde(default)]
    pub description: String,
    /// Due date as an ISO-8601 timestamp string.
    #[serde(default)]
    pub date: String,
    /// Initial status; empty means `Pending`.
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

impl NewTask {
    /// Creates a draft with the given title and no other fields.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Turns the draft into a [`Task`] with the given id.
    ///
    /// A missing or empty status becomes `Pending`.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        let status = self
            .status
            .filter(|s| !s.is_empty())
            .unwrap_or_default();
        Task {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            status,
        }
    }
}

/// Partial edit of a task. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New due date.
    pub date: Option<String>,
    /// New status.
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    /// Returns `true` if the patch would not change anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.status.is_none()
    }
}
