//! Shared data types and storage codec for `Taskpad`.

pub mod codec;
pub mod pending;
pub mod task;
pub mod user;

pub use pending::PendingOperation;
pub use task::{NewTask, Task, TaskId, TaskPatch, TaskStatus};
pub use user::{UserId, UserProfile};
