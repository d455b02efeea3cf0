//! Integration tests for the offline-first sync flow over in-memory
//! collaborators.
//!
//! Each test builds a `TaskSync` on `MemoryStorage`, `MemoryRemote` and a
//! `ManualConnectivity` flag, then walks through a user-visible scenario:
//! queueing while offline, coalescing, draining on reconnect, and the
//! guarded no-ops.

use taskpad::connectivity::ManualConnectivity;
use taskpad::remote::{MemoryRemote, RemoteCall, RemoteError};
use taskpad::session::{MemorySecureStore, SessionStore};
use taskpad::storage::{MemoryStorage, PENDING_KEY, TASK_LIST_KEY};
use taskpad::tasks::{Route, SyncError, TaskBoard, TaskSync};
use taskpad_proto::{NewTask, PendingOperation, TaskId, TaskPatch, TaskStatus, UserId};

type MemSync = TaskSync<MemoryStorage, MemoryRemote, ManualConnectivity, MemorySecureStore>;

struct World {
    sync: MemSync,
    storage: MemoryStorage,
    remote: MemoryRemote,
    net: ManualConnectivity,
    uid: UserId,
}

async fn world(online: bool) -> World {
    let storage = MemoryStorage::new();
    let remote = MemoryRemote::new();
    let net = ManualConnectivity::new(online);
    let session = SessionStore::new(MemorySecureStore::new());
    let uid = UserId::new("user-1");
    session.set_session(&uid).await;
    let sync = TaskSync::new(storage.clone(), remote.clone(), net.clone(), session);
    World {
        sync,
        storage,
        remote,
        net,
        uid,
    }
}

fn buy_milk() -> NewTask {
    NewTask {
        title: "Buy milk".into(),
        date: "2024-01-01".into(),
        ..NewTask::default()
    }
}

#[tokio::test]
async fn offline_add_is_queued_and_snapshotted() {
    let w = world(false).await;
    let m = w.sync.add(&[], buy_milk()).await.unwrap();

    assert_eq!(m.route, Route::Queued);
    let snapshot = w.sync.snapshot().load_tasks().await.unwrap().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].title, "Buy milk");
    assert_eq!(snapshot[0].status, TaskStatus::pending());

    let queue = w.sync.pending().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert!(matches!(&queue.as_slice()[0], PendingOperation::Add { task } if task.id == m.value.id));
    assert!(w.remote.calls().is_empty());
}

#[tokio::test]
async fn offline_add_then_update_leaves_one_update() {
    let w = world(false).await;
    let added = w.sync.add(&[], buy_milk()).await.unwrap();
    let patch = TaskPatch {
        description: Some("2 litres".into()),
        status: Some(TaskStatus::in_progress()),
        ..TaskPatch::default()
    };
    let edited = w
        .sync
        .edit(&added.tasks, &added.value.id, patch)
        .await
        .unwrap()
        .unwrap();

    let queue = w.sync.pending().await.unwrap();
    assert_eq!(queue.len(), 1);
    let PendingOperation::Update { task } = &queue.as_slice()[0] else {
        panic!("expected a single update, got {queue:?}");
    };
    assert_eq!(task.id, added.value.id);
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.description, "2 litres");
    assert_eq!(task.status, TaskStatus::in_progress());

    let snapshot = w.sync.snapshot().load_tasks().await.unwrap().unwrap();
    assert_eq!(snapshot, edited.tasks);
    assert_eq!(snapshot[0], *task);
}

#[tokio::test]
async fn reconnect_drains_add_and_overwrites_snapshot() {
    let w = world(false).await;
    let added = w.sync.add(&[], buy_milk()).await.unwrap();

    w.net.set_online(true);
    let tasks = w.sync.load().await.unwrap();

    assert_eq!(
        w.remote.calls(),
        vec![
            RemoteCall::Create(w.uid.clone(), added.value.clone()),
            RemoteCall::List(w.uid.clone()),
        ]
    );
    assert!(w.storage.peek(PENDING_KEY).is_none());
    assert_eq!(tasks, vec![added.value]);
    assert_eq!(
        w.sync.snapshot().load_tasks().await.unwrap(),
        Some(tasks)
    );
}

#[tokio::test]
async fn offline_delete_of_unknown_task_still_queues() {
    let w = world(false).await;
    let added = w.sync.add(&[], buy_milk()).await.unwrap();
    let m = w
        .sync
        .delete(&added.tasks, &TaskId::new("999"))
        .await
        .unwrap();

    assert_eq!(m.tasks, added.tasks);
    assert_eq!(
        w.sync.snapshot().load_tasks().await.unwrap(),
        Some(added.tasks)
    );
    let queue = w.sync.pending().await.unwrap();
    assert_eq!(
        queue.as_slice()[0],
        PendingOperation::Delete {
            id: TaskId::new("999")
        }
    );
}

#[tokio::test]
async fn complete_of_unknown_task_changes_nothing() {
    let w = world(false).await;
    let added = w.sync.add(&[], buy_milk()).await.unwrap();
    let snapshot_before = w.storage.peek(TASK_LIST_KEY);
    let queue_before = w.storage.peek(PENDING_KEY);

    let out = w
        .sync
        .complete(&added.tasks, &TaskId::new("999"))
        .await
        .unwrap();

    assert!(out.is_none());
    assert_eq!(w.storage.peek(TASK_LIST_KEY), snapshot_before);
    assert_eq!(w.storage.peek(PENDING_KEY), queue_before);
}

#[tokio::test]
async fn add_then_delete_offline_replays_stray_delete() {
    let w = world(false).await;
    let added = w.sync.add(&[], buy_milk()).await.unwrap();
    w.sync
        .delete(&added.tasks, &added.value.id)
        .await
        .unwrap();

    w.net.set_online(true);
    let tasks = w.sync.load().await.unwrap();

    assert!(tasks.is_empty());
    assert_eq!(
        w.remote.calls(),
        vec![
            RemoteCall::Delete(w.uid.clone(), added.value.id.clone()),
            RemoteCall::List(w.uid.clone()),
        ]
    );
}

#[tokio::test]
async fn offline_add_then_edit_reaches_remote_on_reconnect() {
    let w = world(false).await;
    let added = w.sync.add(&[], buy_milk()).await.unwrap();
    let patch = TaskPatch {
        title: Some("Buy oat milk".into()),
        ..TaskPatch::default()
    };
    let edited = w
        .sync
        .edit(&added.tasks, &added.value.id, patch)
        .await
        .unwrap()
        .unwrap();
    let done = w
        .sync
        .complete(&edited.tasks, &added.value.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(w.sync.pending().await.unwrap().len(), 1);

    w.net.set_online(true);
    let tasks = w.sync.load().await.unwrap();

    assert_eq!(tasks, vec![done.value.clone()]);
    assert_eq!(w.remote.tasks(&w.uid), vec![done.value.clone()]);
    assert_eq!(done.value.title, "Buy oat milk");
    assert!(done.value.status.is_completed());
    assert!(w.storage.peek(PENDING_KEY).is_none());

    w.remote.clear_calls();
    assert_eq!(w.sync.load().await.unwrap(), tasks);
    assert_eq!(w.remote.calls(), vec![RemoteCall::List(w.uid.clone())]);
}

#[tokio::test]
async fn queued_update_for_task_missing_remotely_is_recreated() {
    let w = world(false).await;
    let task = taskpad_proto::Task {
        id: TaskId::new("42"),
        title: "Only on another device".into(),
        description: String::new(),
        date: String::new(),
        status: TaskStatus::pending(),
    };
    let done = w
        .sync
        .complete(std::slice::from_ref(&task), &task.id)
        .await
        .unwrap()
        .unwrap();

    w.net.set_online(true);
    let tasks = w.sync.load().await.unwrap();

    assert_eq!(tasks, vec![done.value]);
    assert!(w.sync.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_replay_keeps_queue_until_remote_recovers() {
    let w = world(false).await;
    let added = w.sync.add(&[], buy_milk()).await.unwrap();

    w.net.set_online(true);
    w.remote.fail_next(RemoteError::Transport("connection reset".into()));
    match w.sync.load().await.unwrap_err() {
        SyncError::Replay { index, id, source, .. } => {
            assert_eq!(index, 0);
            assert_eq!(id, added.value.id);
            assert_eq!(source, RemoteError::Transport("connection reset".into()));
        }
        other => panic!("expected replay failure, got {other:?}"),
    }
    assert_eq!(w.sync.pending().await.unwrap().len(), 1);

    assert_eq!(w.sync.load().await.unwrap(), vec![added.value]);
    assert!(w.sync.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn board_survives_offline_session_and_reconnect() {
    let w = world(true).await;
    let mut board = TaskBoard::new();
    assert!(board.refresh(&w.sync).await);
    let online = board.add(&w.sync, NewTask::titled("online")).await.unwrap();

    w.net.set_online(false);
    let offline = board.add(&w.sync, NewTask::titled("offline")).await.unwrap();
    board.complete(&w.sync, &online.id).await.unwrap();
    assert_eq!(board.tasks().len(), 2);
    assert_eq!(w.sync.pending().await.unwrap().len(), 2);

    w.net.set_online(true);
    assert!(board.refresh(&w.sync).await);
    assert!(w.sync.pending().await.unwrap().is_empty());

    let remote = w.remote.tasks(&w.uid);
    assert_eq!(remote.len(), 2);
    assert!(remote.iter().any(|t| t.id == offline.id));
    assert!(
        remote
            .iter()
            .find(|t| t.id == online.id)
            .is_some_and(|t| t.status.is_completed())
    );
}

#[tokio::test]
async fn guest_mutations_queue_even_when_online() {
    let storage = MemoryStorage::new();
    let remote = MemoryRemote::new();
    let sync = TaskSync::new(
        storage,
        remote.clone(),
        ManualConnectivity::online(),
        SessionStore::new(MemorySecureStore::new()),
    );
    let m = sync.add(&[], buy_milk()).await.unwrap();

    assert_eq!(m.route, Route::Queued);
    assert!(remote.calls().is_empty());
    assert_eq!(sync.load().await.unwrap(), m.tasks);
}
