//! Property-based tests for the snapshot and queue codec.
//!
//! Uses proptest to verify:
//! 1. Any task list survives encode → decode with order preserved.
//! 2. Any pending queue survives encode → decode with order preserved.
//! 3. Arbitrary text never causes a panic in decode (returns `Err` gracefully).
//! 4. Every encoded operation carries its lowercase `type` tag.

use proptest::prelude::*;
use taskpad_proto::codec;
use taskpad_proto::{PendingOperation, Task, TaskId, TaskStatus};

/// Strategy for `TaskStatus`: mostly the well-known values, sometimes free text.
fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::pending()),
        Just(TaskStatus::in_progress()),
        Just(TaskStatus::completed()),
        "[a-zA-Z ]{0,16}".prop_map(TaskStatus::new),
    ]
}

/// Strategy for `Task` with millisecond ids and unicode text.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        any::<u64>(),
        "\\PC{0,64}",
        "\\PC{0,128}",
        "[0-9T:.Z-]{0,24}",
        arb_status(),
    )
        .prop_map(|(id, title, description, date, status)| Task {
            id: TaskId::from_millis(id),
            title,
            description,
            date,
            status,
        })
}

/// Strategy for `PendingOperation`.
fn arb_op() -> impl Strategy<Value = PendingOperation> {
    prop_oneof![
        arb_task().prop_map(|task| PendingOperation::Add { task }),
        arb_task().prop_map(|task| PendingOperation::Update { task }),
        any::<u64>().prop_map(|id| PendingOperation::Delete {
            id: TaskId::from_millis(id)
        }),
    ]
}

proptest! {
    #[test]
    fn task_list_round_trip(tasks in prop::collection::vec(arb_task(), 0..32)) {
        let encoded = codec::encode_tasks(&tasks).unwrap();
        let decoded = codec::decode_tasks(&encoded).unwrap();
        prop_assert_eq!(decoded, tasks);
    }

    #[test]
    fn queue_round_trip(queue in prop::collection::vec(arb_op(), 0..32)) {
        let encoded = codec::encode_queue(&queue).unwrap();
        let decoded = codec::decode_queue(&encoded).unwrap();
        prop_assert_eq!(decoded, queue);
    }

    #[test]
    fn decode_never_panics(text in "\\PC{0,256}") {
        let _ = codec::decode_tasks(&text);
        let _ = codec::decode_queue(&text);
    }

    #[test]
    fn operations_carry_type_tag(op in arb_op()) {
        let value = serde_json::to_value(&op).unwrap();
        prop_assert_eq!(value["type"].as_str(), Some(op.kind()));
    }
}
