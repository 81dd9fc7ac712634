//! Wire record shapes exchanged with the Taskboard REST API.
//!
//! The wire representation differs from the client's internal model: the
//! identity field is `_id`, the due date is a full ISO-8601 timestamp
//! string, and `description` may be absent. The client-side adapter owns
//! the mapping; the server stores records in this shape directly.

use serde::{Deserialize, Serialize};

/// Task status values as they appear on the wire.
///
/// The wire format uses the SCREAMING_SNAKE_CASE names (`"TODO"`,
/// `"IN_PROGRESS"`, `"DONE"`); [`std::fmt::Display`] and
/// [`std::str::FromStr`] round-trip through the same spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task has not been started.
    Todo,
    /// Task is actively being worked on.
    InProgress,
    /// Task is finished.
    Done,
}

impl TaskStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todo => write!(f, "TODO"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

/// Error returned when a string is not one of the wire status names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct InvalidStatus(pub String);

impl std::str::FromStr for TaskStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DONE" => Ok(Self::Done),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

/// A full task record as returned by the server.
///
/// `status` is carried as a raw string so that receivers decide how
/// strictly to validate it (the client adapter rejects unknown values).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    /// Server-assigned identity (document-store key).
    #[serde(rename = "_id")]
    pub id: String,
    /// Task title.
    pub title: String,
    /// Optional description; servers may omit it entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Assignee display name.
    pub assignee: String,
    /// Full ISO-8601 timestamp string (e.g. `2024-06-01T00:00:00.000Z`).
    #[serde(rename = "dueDate")]
    pub due_date: String,
    /// One of `TODO`, `IN_PROGRESS`, `DONE`.
    pub status: String,
}

/// A task body without identity, sent on create and full replace.
///
/// The server supplies `_id` via the resource path (replace) or assigns a
/// fresh one (create); it is never part of this body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDraft {
    /// Task title.
    pub title: String,
    /// Description; defaults to empty rather than being omitted.
    #[serde(default)]
    pub description: String,
    /// Assignee display name.
    pub assignee: String,
    /// Full ISO-8601 timestamp string.
    #[serde(rename = "dueDate")]
    pub due_date: String,
    /// One of `TODO`, `IN_PROGRESS`, `DONE`.
    pub status: String,
}

/// A partial task body for PATCH; only present fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePatch {
    /// New title, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New assignee, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// New due date (full ISO-8601 timestamp), if changing.
    #[serde(rename = "dueDate", default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// New status, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl WirePatch {
    /// Returns `true` if no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assignee.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }
}

/// One page of the task collection plus the full matching count.
///
/// `total` counts every record matching the active filter/status, not just
/// the records on this page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePage {
    /// Records on the requested page, in server order.
    pub tasks: Vec<WireRecord>,
    /// Full matching count across all pages.
    pub total: u64,
}

/// Response body for a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveReceipt {
    /// Human-readable confirmation.
    pub message: String,
    /// Remaining document count after the delete.
    pub total: u64,
}

/// Error body returned by the server for failed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error summary.
    pub message: String,
    /// Field-level validation messages, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}
