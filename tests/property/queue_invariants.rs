//! Property-based tests for the pending queue and offline mutations.
//!
//! Uses proptest to verify:
//! 1. The queue never holds more than one add/update per task id.
//! 2. Offline, every mutation leaves the snapshot equal to the expected
//!    list computed independently from the previous one.
//! 3. Offline, every mutation is reflected in the queue.

use std::collections::HashMap;

use proptest::prelude::*;
use taskpad::connectivity::ManualConnectivity;
use taskpad::remote::MemoryRemote;
use taskpad::session::{MemorySecureStore, SessionStore};
use taskpad::storage::MemoryStorage;
use taskpad::tasks::{PendingQueue, QueuePolicy, TaskSync};
use taskpad_proto::{NewTask, PendingOperation, Task, TaskId, TaskStatus};

/// Strategy for a queue operation over a small id space, so ids collide.
fn arb_op() -> impl Strategy<Value = PendingOperation> {
    let task = (0u64..6, "[a-z]{1,8}").prop_map(|(id, title)| Task {
        id: TaskId::from_millis(id),
        title,
        description: String::new(),
        date: String::new(),
        status: TaskStatus::pending(),
    });
    prop_oneof![
        task.clone().prop_map(|task| PendingOperation::Add { task }),
        task.prop_map(|task| PendingOperation::Update { task }),
        (0u64..6).prop_map(|id| PendingOperation::Delete {
            id: TaskId::from_millis(id)
        }),
    ]
}

/// A user action against the current list. `pick` selects a task by
/// position; `None` targets an id that is not in the list.
#[derive(Debug, Clone)]
enum Action {
    Add(String),
    Retitle(Option<usize>, String),
    Delete(Option<usize>),
    Complete(Option<usize>),
}

fn arb_pick() -> impl Strategy<Value = Option<usize>> {
    prop_oneof![4 => any::<usize>().prop_map(Some), 1 => Just(None)]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(Action::Add),
        (arb_pick(), "[a-z]{1,8}").prop_map(|(p, t)| Action::Retitle(p, t)),
        arb_pick().prop_map(Action::Delete),
        arb_pick().prop_map(Action::Complete),
    ]
}

fn resolve(list: &[Task], pick: Option<usize>) -> Option<&Task> {
    if list.is_empty() {
        return None;
    }
    pick.map(|i| &list[i % list.len()])
}

fn non_delete_counts(queue: &PendingQueue) -> HashMap<TaskId, usize> {
    let mut counts = HashMap::new();
    for op in queue {
        if !op.is_delete() {
            *counts.entry(op.task_id().clone()).or_default() += 1;
        }
    }
    counts
}

proptest! {
    #[test]
    fn at_most_one_non_delete_per_id(
        ops in prop::collection::vec(arb_op(), 0..64),
        elide in any::<bool>(),
    ) {
        let policy = QueuePolicy { elide_unsynced_deletes: elide };
        let mut queue = PendingQueue::new();
        for op in ops {
            queue.push(op, policy);
            prop_assert!(non_delete_counts(&queue).values().all(|&n| n <= 1));
        }
    }

    #[test]
    fn newest_operation_is_at_the_head(ops in prop::collection::vec(arb_op(), 1..32)) {
        let mut queue = PendingQueue::new();
        for op in ops {
            let expected = op.clone();
            queue.push(op, QueuePolicy::default());
            prop_assert_eq!(&queue.as_slice()[0], &expected);
        }
    }

    #[test]
    fn offline_mutations_are_optimistically_consistent(
        actions in prop::collection::vec(arb_action(), 1..24),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let sync = TaskSync::new(
                MemoryStorage::new(),
                MemoryRemote::new(),
                ManualConnectivity::offline(),
                SessionStore::new(MemorySecureStore::new()),
            );
            let mut list: Vec<Task> = Vec::new();

            for action in actions {
                let before_queue = sync.pending().await.unwrap().len();
                let expected: Vec<Task> = match action {
                    Action::Add(title) => {
                        let m = sync.add(&list, NewTask::titled(title.clone())).await.unwrap();
                        prop_assert_eq!(&m.value.title, &title);
                        prop_assert_eq!(&m.value.status, &TaskStatus::pending());
                        let mut expected = vec![m.value.clone()];
                        expected.extend(list.iter().cloned());
                        prop_assert_eq!(&m.tasks, &expected);
                        expected
                    }
                    Action::Retitle(pick, title) => {
                        let mut task = resolve(&list, pick)
                            .cloned()
                            .unwrap_or_else(|| Task {
                                id: TaskId::new("missing"),
                                title: String::new(),
                                description: String::new(),
                                date: String::new(),
                                status: TaskStatus::pending(),
                            });
                        task.title = title;
                        let m = sync.update(&list, task.clone()).await.unwrap();
                        let expected: Vec<Task> = list
                            .iter()
                            .map(|t| if t.id == task.id { task.clone() } else { t.clone() })
                            .collect();
                        prop_assert_eq!(&m.tasks, &expected);
                        expected
                    }
                    Action::Delete(pick) => {
                        let id = resolve(&list, pick)
                            .map_or_else(|| TaskId::new("missing"), |t| t.id.clone());
                        let m = sync.delete(&list, &id).await.unwrap();
                        let expected: Vec<Task> =
                            list.iter().filter(|t| t.id != id).cloned().collect();
                        prop_assert_eq!(&m.tasks, &expected);
                        expected
                    }
                    Action::Complete(pick) => {
                        let Some(target) = resolve(&list, pick).cloned() else {
                            let m = sync.complete(&list, &TaskId::new("missing")).await.unwrap();
                            prop_assert!(m.is_none());
                            prop_assert_eq!(sync.pending().await.unwrap().len(), before_queue);
                            continue;
                        };
                        let m = sync.complete(&list, &target.id).await.unwrap().unwrap();
                        let expected: Vec<Task> = list
                            .iter()
                            .map(|t| {
                                if t.id == target.id {
                                    Task { status: TaskStatus::completed(), ..t.clone() }
                                } else {
                                    t.clone()
                                }
                            })
                            .collect();
                        prop_assert_eq!(&m.tasks, &expected);
                        expected
                    }
                };

                let stored = sync.snapshot().load_tasks().await.unwrap().unwrap_or_default();
                prop_assert_eq!(&stored, &expected);
                prop_assert!(!sync.pending().await.unwrap().is_empty());
                list = expected;
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
