//! End-to-end tests against an in-process `taskpad-server`.
//!
//! Starts the server on `127.0.0.1:0`, points an `HttpBackend` at it and
//! drives accounts and task sync through the real HTTP routes.

use std::time::Duration;

use taskpad::auth::{AuthError, AuthService};
use taskpad::connectivity::{Connectivity, ManualConnectivity, ProbeConnectivity};
use taskpad::remote::{HttpBackend, RemoteError, RemoteTaskStore};
use taskpad::session::{MemorySecureStore, SessionStore};
use taskpad::storage::{FileStorage, MemoryStorage};
use taskpad::tasks::{Route, TaskBoard, TaskSync};
use taskpad_proto::{NewTask, Task, TaskId, TaskPatch, TaskStatus, UserId};
use url::Url;

async fn start() -> (Url, tokio::task::JoinHandle<()>) {
    let (addr, handle) = taskpad_server::server::start_server("127.0.0.1:0")
        .await
        .unwrap();
    (Url::parse(&format!("http://{addr}/")).unwrap(), handle)
}

fn backend(base: &Url) -> HttpBackend {
    HttpBackend::new(base.clone(), Duration::from_secs(5)).unwrap()
}

fn task(id: &str, title: &str) -> Task {
    Task {
        id: TaskId::new(id),
        title: title.to_string(),
        description: String::new(),
        date: "2024-01-01T00:00:00.000Z".to_string(),
        status: TaskStatus::pending(),
    }
}

#[tokio::test]
async fn remote_store_contract_over_http() {
    let (base, handle) = start().await;
    let remote = backend(&base);
    let uid = UserId::new("u1");

    remote.create(&uid, &task("2", "two")).await.unwrap();
    remote.create(&uid, &task("1", "one")).await.unwrap();

    let mut done = task("1", "one");
    done.status = TaskStatus::completed();
    remote.update(&uid, &done).await.unwrap();

    let err = remote.update(&uid, &task("9", "ghost")).await.unwrap_err();
    assert_eq!(err, RemoteError::NotFound(TaskId::new("9")));

    remote.delete(&uid, &TaskId::new("2")).await.unwrap();
    remote.delete(&uid, &TaskId::new("2")).await.unwrap();

    assert_eq!(remote.list(&uid).await.unwrap(), vec![done]);
    assert!(remote.list(&UserId::new("u2")).await.unwrap().is_empty());

    remote
        .batch_write(&uid, &[task("3", "three"), task("4", "four")])
        .await
        .unwrap();
    assert_eq!(remote.list(&uid).await.unwrap().len(), 3);
    handle.abort();
}

#[tokio::test]
async fn account_flow_maps_backend_codes() {
    let (base, handle) = start().await;
    let storage = MemoryStorage::new();
    let secret = MemorySecureStore::new();
    let auth = AuthService::new(
        backend(&base),
        storage,
        SessionStore::new(secret.clone()),
        ManualConnectivity::online(),
    );

    let created = auth
        .sign_up("Ann Example", "ann@example.com", "secret1")
        .await
        .unwrap();
    assert_eq!(
        auth.sign_up("Ann Again", "ann@example.com", "secret2")
            .await
            .unwrap_err(),
        AuthError::EmailAlreadyInUse
    );
    assert_eq!(
        auth.sign_up("Bob", "bob", "secret1").await.unwrap_err(),
        AuthError::InvalidEmail
    );
    assert_eq!(
        auth.sign_up("Bob", "bob@example.com", "123")
            .await
            .unwrap_err(),
        AuthError::WeakPassword
    );
    assert!(auth.restore_user().await.is_none());

    assert_eq!(
        auth.sign_in("ann@example.com", "nope!!").await.unwrap_err(),
        AuthError::WrongPassword
    );
    assert_eq!(
        auth.sign_in("zed@example.com", "secret1")
            .await
            .unwrap_err(),
        AuthError::UserNotFound
    );

    let profile = auth.sign_in("ann@example.com", "secret1").await.unwrap();
    assert_eq!(profile, created);
    assert_eq!(auth.restore_user().await, Some(created));

    auth.sign_out().await;
    assert!(auth.restore_user().await.is_none());
    handle.abort();
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let base = Url::parse(&format!("http://{addr}/")).unwrap();

    let auth = AuthService::new(
        backend(&base),
        MemoryStorage::new(),
        SessionStore::new(MemorySecureStore::new()),
        ManualConnectivity::online(),
    );
    assert_eq!(
        auth.sign_in("ann@example.com", "secret1")
            .await
            .unwrap_err(),
        AuthError::NetworkRequestFailed
    );

    let probe = ProbeConnectivity::new(&base, Duration::from_millis(200)).unwrap();
    assert!(!probe.is_online().await);
}

#[tokio::test]
async fn offline_edits_reach_the_server_after_reconnect() {
    let (base, handle) = start().await;
    let data = tempfile::tempdir().unwrap();
    let remote = backend(&base);
    let net = ManualConnectivity::online();
    let secret = MemorySecureStore::new();

    let auth = AuthService::new(
        remote.clone(),
        FileStorage::new(data.path()),
        SessionStore::new(secret.clone()),
        net.clone(),
    );
    auth.sign_up("Ann", "ann@example.com", "secret1")
        .await
        .unwrap();
    let profile = auth.sign_in("ann@example.com", "secret1").await.unwrap();

    let probe = ProbeConnectivity::new(&base, Duration::from_secs(1)).unwrap();
    assert!(probe.is_online().await);

    let sync = TaskSync::new(
        FileStorage::new(data.path()),
        remote.clone(),
        net.clone(),
        SessionStore::new(secret),
    );
    let mut board = TaskBoard::new();
    assert!(board.refresh(&sync).await);
    let first = board
        .add(&sync, NewTask::titled("written through"))
        .await
        .unwrap();

    net.set_online(false);
    let queued = sync
        .add(board.tasks(), NewTask::titled("queued"))
        .await
        .unwrap();
    assert_eq!(queued.route, Route::Queued);
    let queued_task = queued.value.clone();
    board = TaskBoard::with_tasks(queued.tasks);
    board.complete(&sync, &first.id).await.unwrap();
    assert_eq!(sync.pending().await.unwrap().len(), 2);
    assert_eq!(remote.list(&profile.uid).await.unwrap(), vec![first.clone()]);

    net.set_online(true);
    assert!(board.refresh(&sync).await);
    assert!(sync.pending().await.unwrap().is_empty());

    let on_server = remote.list(&profile.uid).await.unwrap();
    assert_eq!(on_server.len(), 2);
    assert!(on_server.contains(&queued_task));
    assert!(
        on_server
            .iter()
            .any(|t| t.id == first.id && t.status.is_completed())
    );
    assert_eq!(board.tasks(), on_server.as_slice());
    handle.abort();
}

#[tokio::test]
async fn task_added_and_edited_offline_is_created_on_reconnect() {
    let (base, handle) = start().await;
    let remote = backend(&base);
    let net = ManualConnectivity::offline();
    let secret = MemorySecureStore::new();

    let auth = AuthService::new(
        remote.clone(),
        MemoryStorage::new(),
        SessionStore::new(secret.clone()),
        ManualConnectivity::online(),
    );
    auth.sign_up("Bo", "bo@example.com", "secret1")
        .await
        .unwrap();
    let profile = auth.sign_in("bo@example.com", "secret1").await.unwrap();

    let sync = TaskSync::new(
        MemoryStorage::new(),
        remote.clone(),
        net.clone(),
        SessionStore::new(secret),
    );
    let mut board = TaskBoard::new();
    let added = board.add(&sync, NewTask::titled("draft")).await.unwrap();
    let patch = TaskPatch {
        description: Some("from the train".into()),
        ..TaskPatch::default()
    };
    let edited = board
        .edit(&sync, &added.id, patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sync.pending().await.unwrap().len(), 1);

    net.set_online(true);
    assert!(board.refresh(&sync).await);
    assert!(sync.pending().await.unwrap().is_empty());
    assert_eq!(remote.list(&profile.uid).await.unwrap(), vec![edited.clone()]);
    assert_eq!(board.tasks(), &[edited]);
    handle.abort();
}
