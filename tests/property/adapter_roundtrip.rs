//! Property-based tests for the wire adapter.
//!
//! Uses proptest to verify:
//! 1. Any valid task survives the draft → wire → record → task round-trip.
//! 2. Day extraction ignores the time-of-day and timezone suffix entirely.
//! 3. Status strings outside the closed enum are rejected, never panicking.

use chrono::NaiveDate;
use proptest::prelude::*;

use taskboard::adapter;
use taskboard::model::{Task, TaskDraft, TaskStatus};
use taskboard_proto::record::WireRecord;

// --- Strategies ---

/// Strategy for generating arbitrary calendar days.
///
/// Days are capped at 28 so every (year, month, day) triple is valid.
fn arb_day() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    })
}

/// Strategy for generating arbitrary task statuses.
fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

/// Strategy for generating arbitrary tasks.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-f0-9]{24}",
        "[a-zA-Z0-9 ]{1,40}",
        "[a-zA-Z0-9 ]{0,80}",
        "[a-z]{1,16}",
        arb_day(),
        arb_status(),
    )
        .prop_map(|(id, title, description, assignee, due_date, status)| Task {
            id,
            title,
            description,
            assignee,
            due_date,
            status,
        })
}

/// Echoes a draft back as the record a server would return.
fn echo(id: &str, draft: &taskboard_proto::record::WireDraft) -> WireRecord {
    WireRecord {
        id: id.to_string(),
        title: draft.title.clone(),
        description: Some(draft.description.clone()),
        assignee: draft.assignee.clone(),
        due_date: draft.due_date.clone(),
        status: draft.status.clone(),
    }
}

proptest! {
    #[test]
    fn round_trip_reproduces_any_valid_task(task in arb_task()) {
        let wire = adapter::to_wire(&TaskDraft::from_task(&task));
        let back = adapter::from_wire(&echo(&task.id, &wire)).unwrap();
        prop_assert_eq!(back, task);
    }

    #[test]
    fn day_extraction_ignores_time_and_zone(
        day in arb_day(),
        hour in 0u32..24,
        minute in 0u32..60,
        offset in prop_oneof!["Z".prop_map(String::from), "[+-]0[0-9]:00"],
    ) {
        let record = WireRecord {
            id: "663a1f".to_string(),
            title: "Ship release".to_string(),
            description: None,
            assignee: "maria".to_string(),
            due_date: format!("{}T{hour:02}:{minute:02}:00.000{offset}", day.format("%Y-%m-%d")),
            status: "TODO".to_string(),
        };
        let task = adapter::from_wire(&record).unwrap();
        prop_assert_eq!(task.due_date, day);
    }

    #[test]
    fn unknown_status_is_an_error_not_a_panic(status in "[A-Z_]{1,16}") {
        prop_assume!(!matches!(status.as_str(), "TODO" | "IN_PROGRESS" | "DONE"));
        let record = WireRecord {
            id: "663a1f".to_string(),
            title: "Ship release".to_string(),
            description: None,
            assignee: "maria".to_string(),
            due_date: "2024-06-01T00:00:00.000Z".to_string(),
            status,
        };
        prop_assert!(adapter::from_wire(&record).is_err());
    }

    #[test]
    fn garbage_due_date_is_an_error_not_a_panic(due_date in "[a-z ]{0,20}") {
        let record = WireRecord {
            id: "663a1f".to_string(),
            title: "Ship release".to_string(),
            description: None,
            assignee: "maria".to_string(),
            due_date,
            status: "TODO".to_string(),
        };
        prop_assert!(adapter::from_wire(&record).is_err());
    }
}
