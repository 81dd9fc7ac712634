//! Pure mapping between wire records and the internal task model.
//!
//! No I/O and no state; the only failure mode is a malformed incoming
//! record (unknown status or unparseable due date). Outbound mapping is
//! total.
//!
//! Due-date handling is deliberately textual: the calendar day is taken
//! from the timestamp string before any `T`, never by converting through
//! a timezone-aware clock. A record due `2024-03-01T23:30:00.000-05:00`
//! is due on 2024-03-01 no matter where the client runs, and
//! `from_wire(to_wire(t)) == t` holds exactly.

use chrono::NaiveDate;

use taskboard_proto::record::{InvalidStatus, WireDraft, WirePatch, WireRecord};

use crate::model::{Task, TaskDraft, TaskPatch};

/// Errors produced when an incoming wire record cannot be mapped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The record carried a status outside the closed enum.
    #[error("malformed record: {0}")]
    UnknownStatus(#[from] InvalidStatus),

    /// The record's due date was not a parseable calendar day.
    #[error("malformed record: invalid due date {0:?}")]
    InvalidDueDate(String),
}

/// Maps a wire record into an internal [`Task`].
///
/// Renames `_id` to `id`, defaults a missing description to the empty
/// string, truncates the due-date timestamp to its calendar day, and
/// validates the status.
///
/// # Errors
///
/// Returns [`AdapterError`] if the status is outside the enum or the due
/// date does not start with a valid `YYYY-MM-DD` day.
pub fn from_wire(record: &WireRecord) -> Result<Task, AdapterError> {
    Ok(Task {
        id: record.id.clone(),
        title: record.title.clone(),
        description: record.description.clone().unwrap_or_default(),
        assignee: record.assignee.clone(),
        due_date: truncate_day(&record.due_date)?,
        status: record.status.parse()?,
    })
}

/// Maps a draft into the full-replace wire body.
///
/// Expands the calendar day into the canonical midnight-UTC timestamp and
/// omits the identity field (the gateway supplies it via the resource
/// path).
#[must_use]
pub fn to_wire(draft: &TaskDraft) -> WireDraft {
    WireDraft {
        title: draft.title.clone(),
        description: draft.description.clone(),
        assignee: draft.assignee.clone(),
        due_date: expand_day(draft.due_date),
        status: draft.status.to_string(),
    }
}

/// Maps a partial update into the PATCH wire body.
///
/// Only present fields are included; the due date gets the same expansion
/// as [`to_wire`] and a present status passes through unchanged.
#[must_use]
pub fn to_partial_wire(patch: &TaskPatch) -> WirePatch {
    WirePatch {
        title: patch.title.clone(),
        description: patch.description.clone(),
        assignee: patch.assignee.clone(),
        due_date: patch.due_date.map(expand_day),
        status: patch.status.map(|s| s.to_string()),
    }
}

/// Extracts the calendar day from an ISO-8601 timestamp string.
fn truncate_day(timestamp: &str) -> Result<NaiveDate, AdapterError> {
    let day = timestamp.split('T').next().unwrap_or(timestamp);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| AdapterError::InvalidDueDate(timestamp.to_string()))
}

/// Expands a calendar day into the canonical midnight-UTC timestamp.
fn expand_day(day: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", day.format("%Y-%m-%d"))
}
