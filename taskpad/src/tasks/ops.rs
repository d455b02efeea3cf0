//! Pure list transformations behind each mutation.
//!
//! These compute the optimistic list shown to the user. They never fail and
//! never reorder surviving tasks.

use taskpad_proto::{Task, TaskId};

/// New list with `task` at the front.
#[must_use]
pub fn prepend(tasks: &[Task], task: Task) -> Vec<Task> {
    let mut out = Vec::with_capacity(tasks.len() + 1);
    out.push(task);
    out.extend_from_slice(tasks);
    out
}

/// New list with every task whose id matches `task.id` replaced by `task`.
///
/// If no task matches, the list is returned unchanged.
#[must_use]
pub fn replace(tasks: &[Task], task: &Task) -> Vec<Task> {
    tasks
        .iter()
        .map(|t| if t.id == task.id { task.clone() } else { t.clone() })
        .collect()
}

/// New list without any task whose id is `id`.
#[must_use]
pub fn remove(tasks: &[Task], id: &TaskId) -> Vec<Task> {
    tasks.iter().filter(|t| t.id != *id).cloned().collect()
}

/// The first task with id `id`.
#[must_use]
pub fn find<'a>(tasks: &'a [Task], id: &TaskId) -> Option<&'a Task> {
    tasks.iter().find(|t| t.id == *id)
}
