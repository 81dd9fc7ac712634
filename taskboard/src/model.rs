//! Internal task model and page-query types.
//!
//! These are the shapes the rest of the client works with. They differ
//! from the wire representation (`taskboard-proto`): the identity field is
//! plain `id`, the due date is a calendar day, and the status is typed.
//! The [`crate::adapter`] module owns the mapping between the two.

use chrono::NaiveDate;
use taskboard_proto::query::{DEFAULT_PAGE_SIZE, ListParams};

pub use taskboard_proto::record::TaskStatus;

/// A task as held in the normalized store.
///
/// `id` is assigned by the remote gateway and is immutable once set; the
/// client never invents ids. `title` and `assignee` are non-empty for any
/// record that passed server validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Server-assigned identity.
    pub id: String,
    /// Task title.
    pub title: String,
    /// Free-form description; empty when the server omitted it.
    pub description: String,
    /// Assignee display name.
    pub assignee: String,
    /// Due date at calendar-day precision.
    pub due_date: NaiveDate,
    /// Current status.
    pub status: TaskStatus,
}

/// A task body without identity, used for create and full replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Assignee display name.
    pub assignee: String,
    /// Due date at calendar-day precision.
    pub due_date: NaiveDate,
    /// Initial status.
    pub status: TaskStatus,
}

impl TaskDraft {
    /// Builds the draft corresponding to an existing task (identity dropped).
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            assignee: task.assignee.clone(),
            due_date: task.due_date,
            status: task.status,
        }
    }
}

/// A partial update; only present fields are sent to the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title, if changing.
    pub title: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
    /// New assignee, if changing.
    pub assignee: Option<String>,
    /// New due date, if changing.
    pub due_date: Option<NaiveDate>,
    /// New status, if changing.
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    /// Shorthand for a status-only patch.
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// The current view's intent: which page of which filtered collection.
///
/// `page` is 1-based. Not persisted; the coordinator owns the effective
/// value and publishes it to interested components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// 1-based page index.
    pub page: u32,
    /// Records per page; always > 0.
    pub page_size: u32,
    /// Free-text filter; empty means no filter.
    pub filter_text: String,
    /// Status filter; `None` means no filter.
    pub status: Option<TaskStatus>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            filter_text: String::new(),
            status: None,
        }
    }
}

impl From<&PageQuery> for ListParams {
    fn from(query: &PageQuery) -> Self {
        Self {
            page: query.page,
            page_size: query.page_size,
            filter: if query.filter_text.is_empty() {
                None
            } else {
                Some(query.filter_text.clone())
            },
            status: query.status.map(|s| s.to_string()),
            sort: None,
        }
    }
}
