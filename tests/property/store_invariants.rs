//! Property-based tests for the normalized store reducer.
//!
//! Drives the reducer with arbitrary event sequences and checks that every
//! intermediate snapshot upholds the structural invariants: `order` is
//! exactly the entity key set with each id once, a selection always points
//! at a cached entity, and an error never coexists with `loading`.

use std::collections::HashSet;

use chrono::NaiveDate;
use proptest::prelude::*;

use taskboard::model::{Task, TaskStatus};
use taskboard::store::{Mutation, Snapshot, StoreEvent};

// --- Strategies ---

/// Small id pool so generated sequences collide: upserts hit existing ids,
/// removes hit absent ones, selections go stale across page replaces.
const IDS: [&str; 5] = ["a", "b", "c", "d", "e"];

fn make_task(id: &str, status: TaskStatus) -> Task {
    Task {
        id: id.to_string(),
        title: format!("task {id}"),
        description: String::new(),
        assignee: "maria".to_string(),
        due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default(),
        status,
    }
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

fn arb_task() -> impl Strategy<Value = Task> {
    (0..IDS.len(), arb_status()).prop_map(|(i, status)| make_task(IDS[i], status))
}

/// A page of tasks with distinct ids, as a server would return.
fn arb_page() -> impl Strategy<Value = Vec<Task>> {
    proptest::collection::hash_map(0..IDS.len(), arb_status(), 0..=IDS.len()).prop_map(|picks| {
        picks
            .into_iter()
            .map(|(i, status)| make_task(IDS[i], status))
            .collect()
    })
}

fn arb_event() -> impl Strategy<Value = StoreEvent> {
    prop_oneof![
        Just(StoreEvent::BeginLoad),
        (arb_page(), 0u64..100).prop_map(|(tasks, total)| StoreEvent::LoadSucceeded {
            tasks,
            total
        }),
        "[a-z ]{1,12}".prop_map(StoreEvent::LoadFailed),
        arb_task().prop_map(|t| StoreEvent::MutationSucceeded(Mutation::Created(t))),
        arb_task().prop_map(|t| StoreEvent::MutationSucceeded(Mutation::Updated(t))),
        arb_task().prop_map(|t| StoreEvent::MutationSucceeded(Mutation::Patched(t))),
        (0..IDS.len()).prop_map(|i| StoreEvent::MutationSucceeded(Mutation::Removed(
            IDS[i].to_string()
        ))),
        proptest::option::of(0..IDS.len())
            .prop_map(|i| StoreEvent::Select(i.map(|i| IDS[i].to_string()))),
        proptest::option::of(arb_status()).prop_map(StoreEvent::SetFilterStatus),
    ]
}

proptest! {
    #[test]
    fn any_event_sequence_upholds_snapshot_invariants(
        events in proptest::collection::vec(arb_event(), 0..40),
    ) {
        let mut snapshot = Snapshot::default();
        for event in events {
            snapshot = snapshot.apply(event);

            prop_assert_eq!(snapshot.order.len(), snapshot.entities.len());
            let mut seen = HashSet::new();
            for id in &snapshot.order {
                prop_assert!(snapshot.entities.contains_key(id), "order id missing: {}", id);
                prop_assert!(seen.insert(id.clone()), "duplicate order id: {}", id);
            }

            if let Some(id) = &snapshot.selected_id {
                prop_assert!(
                    snapshot.entities.contains_key(id),
                    "selection points at nothing: {}",
                    id
                );
            }

            if snapshot.error.is_some() {
                prop_assert!(!snapshot.loading);
            }
        }
    }

    #[test]
    fn derived_views_agree_with_the_cache(
        events in proptest::collection::vec(arb_event(), 0..40),
    ) {
        let mut snapshot = Snapshot::default();
        for event in events {
            snapshot = snapshot.apply(event);
        }

        let by_status: usize = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done]
            .into_iter()
            .map(|s| snapshot.count_by_status(s))
            .sum();
        prop_assert_eq!(by_status, snapshot.entities.len());

        match snapshot.filter_status {
            None => prop_assert_eq!(snapshot.filtered_tasks(), snapshot.tasks_in_order()),
            Some(status) => {
                for task in snapshot.filtered_tasks() {
                    prop_assert_eq!(task.status, status);
                }
            }
        }
    }
}
