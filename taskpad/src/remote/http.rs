//! HTTP client for the `taskpad-server` backend.
//!
//! One [`HttpBackend`] value serves both the task document API
//! ([`RemoteTaskStore`]) and the account API
//! ([`AuthProvider`](crate::auth::AuthProvider)).
//!
//! Routes (all bodies JSON):
//!
//! | call          | request                               |
//! |---------------|---------------------------------------|
//! | `create`      | `PUT    /users/{uid}/tasks/{id}`      |
//! | `update`      | `PATCH  /users/{uid}/tasks/{id}`      |
//! | `delete`      | `DELETE /users/{uid}/tasks/{id}`      |
//! | `list`        | `GET    /users/{uid}/tasks`           |
//! | `batch_write` | `POST   /users/{uid}/batch`           |

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use taskpad_proto::user::ErrorBody;
use taskpad_proto::{Task, TaskId, UserId};
use url::Url;

use super::{RemoteError, RemoteTaskStore};

/// JSON-over-HTTP client for `taskpad-server`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    client: Client,
}

impl HttpBackend {
    /// Create a client for the server at `base` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Transport`] if `base` cannot carry a path or
    /// the HTTP client cannot be built.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, RemoteError> {
        if base.cannot_be_a_base() {
            return Err(RemoteError::Transport(format!("invalid server url: {base}")));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self { base, client })
    }

    /// The server base URL.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    pub(crate) const fn client(&self) -> &Client {
        &self.client
    }

    /// Append path segments to the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Transport(format!("invalid server url: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn task_url(&self, uid: &UserId, id: &TaskId) -> Result<Url, RemoteError> {
        self.endpoint(&["users", uid.as_str(), "tasks", id.as_str()])
    }
}

/// Map a transport-level failure.
pub(crate) fn transport_error(err: &reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

/// Turn a non-success response into an error, reading the error body if
/// one was sent.
pub(crate) async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.json::<ErrorBody>().await.ok();
    let (code, message) = body.map_or_else(
        || (String::new(), status.to_string()),
        |b| (b.code, b.message),
    );
    Err(RemoteError::Status {
        status: status.as_u16(),
        code,
        message,
    })
}

impl RemoteTaskStore for HttpBackend {
    async fn create(&self, uid: &UserId, task: &Task) -> Result<(), RemoteError> {
        let url = self.task_url(uid, &task.id)?;
        let response = self
            .client
            .put(url)
            .json(task)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        check_status(response).await?;
        Ok(())
    }

    async fn update(&self, uid: &UserId, task: &Task) -> Result<(), RemoteError> {
        let url = self.task_url(uid, &task.id)?;
        let response = self
            .client
            .patch(url)
            .json(task)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(task.id.clone()));
        }
        check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, uid: &UserId, id: &TaskId) -> Result<(), RemoteError> {
        let url = self.task_url(uid, id)?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        check_status(response).await?;
        Ok(())
    }

    async fn list(&self, uid: &UserId) -> Result<Vec<Task>, RemoteError> {
        let url = self.endpoint(&["users", uid.as_str(), "tasks"])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        check_status(response)
            .await?
            .json::<Vec<Task>>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn batch_write(&self, uid: &UserId, tasks: &[Task]) -> Result<(), RemoteError> {
        let url = self.endpoint(&["users", uid.as_str(), "batch"])?;
        let response = self
            .client
            .post(url)
            .json(tasks)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        check_status(response).await?;
        Ok(())
    }
}
