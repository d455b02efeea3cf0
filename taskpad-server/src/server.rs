//! HTTP routes over a shared [`DocumentStore`].
//!
//! | route                              | handler          |
//! |------------------------------------|------------------|
//! | `GET    /health`                   | liveness         |
//! | `POST   /auth/sign-up`             | create account   |
//! | `POST   /auth/sign-in`             | check password   |
//! | `GET    /users/{uid}`              | profile          |
//! | `GET    /users/{uid}/tasks`        | list, id order   |
//! | `PUT    /users/{uid}/tasks/{id}`   | upsert           |
//! | `PATCH  /users/{uid}/tasks/{id}`   | merge, 404 if absent |
//! | `DELETE /users/{uid}/tasks/{id}`   | idempotent       |
//! | `POST   /users/{uid}/batch`        | upsert many      |
//!
//! Errors are JSON [`ErrorBody`] values with an `auth/...` or `tasks/...`
//! code.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use taskpad_proto::user::{ErrorBody, SignInRequest, SignUpRequest, codes};
use taskpad_proto::{Task, TaskId, TaskPatch, UserId, UserProfile};

use crate::store::{DocumentStore, StoreError};

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::EmailAlreadyInUse => StatusCode::CONFLICT,
            Self::InvalidEmail | Self::WeakPassword(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound | Self::TaskNotFound(_) => StatusCode::NOT_FOUND,
            Self::WrongPassword => StatusCode::UNAUTHORIZED,
        };
        (status, Json(ErrorBody::new(self.code(), self.to_string()))).into_response()
    }
}

type Shared = State<Arc<DocumentStore>>;

async fn health() -> &'static str {
    "ok"
}

async fn sign_up(
    State(store): Shared,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<UserProfile>), StoreError> {
    let profile = store
        .sign_up(&req.full_name, &req.email, &req.password)
        .await
        .inspect_err(|e| tracing::debug!(code = e.code(), "sign-up rejected"))?;
    tracing::info!(uid = %profile.uid, "account created");
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn sign_in(
    State(store): Shared,
    Json(req): Json<SignInRequest>,
) -> Result<Json<UserProfile>, StoreError> {
    let profile = store
        .sign_in(&req.email, &req.password)
        .await
        .inspect_err(|e| tracing::debug!(code = e.code(), "sign-in rejected"))?;
    tracing::info!(uid = %profile.uid, "signed in");
    Ok(Json(profile))
}

async fn profile(
    State(store): Shared,
    Path(uid): Path<UserId>,
) -> Result<Json<UserProfile>, StoreError> {
    store.profile(&uid).await.map(Json)
}

async fn list_tasks(State(store): Shared, Path(uid): Path<UserId>) -> Json<Vec<Task>> {
    Json(store.list_tasks(&uid).await)
}

async fn put_task(
    State(store): Shared,
    Path((uid, id)): Path<(UserId, TaskId)>,
    Json(task): Json<Task>,
) -> Response {
    if task.id != id {
        let body = ErrorBody::new(
            codes::TASK_ID_MISMATCH,
            format!("body id {} does not match path id {id}", task.id),
        );
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }
    tracing::debug!(uid = %uid, task_id = %id, "put task");
    store.put_task(&uid, task).await;
    StatusCode::NO_CONTENT.into_response()
}

async fn patch_task(
    State(store): Shared,
    Path((uid, id)): Path<(UserId, TaskId)>,
    Json(patch): Json<TaskPatch>,
) -> Result<StatusCode, StoreError> {
    store.patch_task(&uid, &id, patch).await?;
    tracing::debug!(uid = %uid, task_id = %id, "patched task");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_task(State(store): Shared, Path((uid, id)): Path<(UserId, TaskId)>) -> StatusCode {
    let existed = store.delete_task(&uid, &id).await;
    tracing::debug!(uid = %uid, task_id = %id, existed, "deleted task");
    StatusCode::NO_CONTENT
}

async fn batch_write(
    State(store): Shared,
    Path(uid): Path<UserId>,
    Json(tasks): Json<Vec<Task>>,
) -> StatusCode {
    let count = store.batch_write(&uid, tasks).await;
    tracing::info!(uid = %uid, count, "batch write");
    StatusCode::NO_CONTENT
}

/// The full route table over `store`.
pub fn router(store: Arc<DocumentStore>) -> axum::Router {
    axum::Router::new()
        .route("/health", get(health))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/users/{uid}", get(profile))
        .route("/users/{uid}/tasks", get(list_tasks))
        .route(
            "/users/{uid}/tasks/{id}",
            put(put_task).patch(patch_task).delete(delete_task),
        )
        .route("/users/{uid}/batch", post(batch_write))
        .with_state(store)
}

/// Starts the server on `addr` with an empty store.
///
/// Returns the bound address and the server task handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(DocumentStore::new())).await
}

/// Starts the server on `addr` over an existing store.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    store: Arc<DocumentStore>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(store);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}
