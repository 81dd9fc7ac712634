//! In-memory task collection with validation, filtering, and pagination.
//!
//! The [`TaskStore`] is the server's source of truth. Documents carry an
//! insertion sequence standing in for a creation timestamp, so the default
//! newest-first ordering is stable even when tasks are created within the
//! same millisecond.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use taskboard_proto::query::{DEFAULT_SORT, ListParams};
use taskboard_proto::record::{TaskStatus, WireDraft, WirePage, WirePatch, WireRecord};

/// Errors produced by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The submitted body failed field validation.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A different task already uses the submitted title.
    #[error("a task with this title already exists")]
    DuplicateTitle,

    /// No task with the given id.
    #[error("task not found")]
    NotFound,
}

/// One stored task.
#[derive(Debug, Clone)]
struct TaskDocument {
    id: String,
    title: String,
    description: String,
    assignee: String,
    due_date: String,
    status: TaskStatus,
    /// Insertion sequence; the sort key behind `createdAt`.
    created_at: u64,
}

impl TaskDocument {
    fn to_record(&self) -> WireRecord {
        WireRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            description: if self.description.is_empty() {
                None
            } else {
                Some(self.description.clone())
            },
            assignee: self.assignee.clone(),
            due_date: self.due_date.clone(),
            status: self.status.to_string(),
        }
    }
}

#[derive(Default)]
struct Inner {
    docs: HashMap<String, TaskDocument>,
    next_seq: u64,
}

/// Thread-safe in-memory task collection.
#[derive(Default)]
pub struct TaskStore {
    inner: RwLock<Inner>,
}

impl TaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and inserts a new task, assigning it an id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] on bad fields and
    /// [`StoreError::DuplicateTitle`] if another task uses the title.
    pub async fn insert(&self, draft: &WireDraft) -> Result<WireRecord, StoreError> {
        let status = validate(draft)?;
        let mut inner = self.inner.write().await;
        if title_taken(&inner, &draft.title, None) {
            return Err(StoreError::DuplicateTitle);
        }

        let doc = TaskDocument {
            id: Uuid::now_v7().simple().to_string(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            assignee: draft.assignee.clone(),
            due_date: draft.due_date.clone(),
            status,
            created_at: inner.next_seq,
        };
        inner.next_seq += 1;
        let record = doc.to_record();
        inner.docs.insert(doc.id.clone(), doc);
        Ok(record)
    }

    /// Validates and fully replaces the task with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id does not exist, plus the
    /// same validation and duplicate-title errors as [`Self::insert`].
    pub async fn replace(&self, id: &str, draft: &WireDraft) -> Result<WireRecord, StoreError> {
        let status = validate(draft)?;
        let mut inner = self.inner.write().await;
        if !inner.docs.contains_key(id) {
            return Err(StoreError::NotFound);
        }
        if title_taken(&inner, &draft.title, Some(id)) {
            return Err(StoreError::DuplicateTitle);
        }

        let Some(doc) = inner.docs.get_mut(id) else {
            return Err(StoreError::NotFound);
        };
        doc.title = draft.title.clone();
        doc.description = draft.description.clone();
        doc.assignee = draft.assignee.clone();
        doc.due_date = draft.due_date.clone();
        doc.status = status;
        Ok(doc.to_record())
    }

    /// Merges a partial update into the task with the given id, validating
    /// the merged result before committing.
    ///
    /// # Errors
    ///
    /// Same as [`Self::replace`].
    pub async fn patch(&self, id: &str, patch: &WirePatch) -> Result<WireRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.docs.get(id) else {
            return Err(StoreError::NotFound);
        };

        let merged = WireDraft {
            title: patch.title.clone().unwrap_or_else(|| existing.title.clone()),
            description: patch
                .description
                .clone()
                .unwrap_or_else(|| existing.description.clone()),
            assignee: patch
                .assignee
                .clone()
                .unwrap_or_else(|| existing.assignee.clone()),
            due_date: patch
                .due_date
                .clone()
                .unwrap_or_else(|| existing.due_date.clone()),
            status: patch
                .status
                .clone()
                .unwrap_or_else(|| existing.status.to_string()),
        };
        let status = validate(&merged)?;
        if title_taken(&inner, &merged.title, Some(id)) {
            return Err(StoreError::DuplicateTitle);
        }

        let Some(doc) = inner.docs.get_mut(id) else {
            return Err(StoreError::NotFound);
        };
        doc.title = merged.title;
        doc.description = merged.description;
        doc.assignee = merged.assignee;
        doc.due_date = merged.due_date;
        doc.status = status;
        Ok(doc.to_record())
    }

    /// Removes the task with the given id, returning how many tasks remain
    /// in the whole collection (unfiltered).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id does not exist.
    pub async fn remove(&self, id: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.docs.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(inner.docs.len() as u64)
    }

    /// Runs a paged query: filter, sort, then slice.
    ///
    /// `total` counts everything matching the filter, across all pages.
    /// Text filtering is a case-insensitive substring match over title,
    /// description, and assignee; status filtering is exact. A page past
    /// the end yields an empty `tasks` list with the unchanged total.
    pub async fn query(&self, params: &ListParams) -> WirePage {
        let inner = self.inner.read().await;

        let needle = params
            .filter
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        let status_filter = params
            .status
            .as_deref()
            .and_then(|s| TaskStatus::from_str(s).ok());

        let mut matching: Vec<&TaskDocument> = inner
            .docs
            .values()
            .filter(|doc| {
                (needle.is_empty() || matches_text(doc, &needle))
                    && status_filter.is_none_or(|wanted| doc.status == wanted)
            })
            .collect();

        sort_docs(&mut matching, params.sort.as_deref().unwrap_or(DEFAULT_SORT));

        let total = matching.len() as u64;
        let page_size = params.page_size.max(1) as usize;
        let skip = (params.page.max(1) as usize - 1) * page_size;
        let tasks = matching
            .into_iter()
            .skip(skip)
            .take(page_size)
            .map(TaskDocument::to_record)
            .collect();

        WirePage { tasks, total }
    }

    /// Number of tasks in the collection, ignoring any filter.
    pub async fn len(&self) -> u64 {
        self.inner.read().await.docs.len() as u64
    }

    /// Whether the collection is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.docs.is_empty()
    }
}

/// Checks all draft fields, collecting every violation.
fn validate(draft: &WireDraft) -> Result<TaskStatus, StoreError> {
    let mut errors = Vec::new();
    if draft.title.trim().is_empty() {
        errors.push("title is required".to_string());
    }
    if draft.assignee.trim().is_empty() {
        errors.push("assignee is required".to_string());
    }
    if parse_day(&draft.due_date).is_none() {
        errors.push("dueDate must be a valid date".to_string());
    }
    let status = match TaskStatus::from_str(&draft.status) {
        Ok(s) => Some(s),
        Err(_) => {
            errors.push("status must be one of TODO, IN_PROGRESS, DONE".to_string());
            None
        }
    };

    match (status, errors.is_empty()) {
        (Some(s), true) => Ok(s),
        _ => Err(StoreError::Validation(errors)),
    }
}

/// Parses the calendar-day prefix of an ISO timestamp.
fn parse_day(timestamp: &str) -> Option<NaiveDate> {
    let day = timestamp.split('T').next().unwrap_or(timestamp);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn title_taken(inner: &Inner, title: &str, exclude_id: Option<&str>) -> bool {
    inner
        .docs
        .values()
        .any(|doc| doc.title == title && Some(doc.id.as_str()) != exclude_id)
}

fn matches_text(doc: &TaskDocument, needle: &str) -> bool {
    doc.title.to_lowercase().contains(needle)
        || doc.description.to_lowercase().contains(needle)
        || doc.assignee.to_lowercase().contains(needle)
}

/// Sorts by a field name with an optional leading `-` for descending.
///
/// Unknown fields fall back to creation order, matching the default.
fn sort_docs(docs: &mut [&TaskDocument], sort: &str) {
    let (descending, field) = sort
        .strip_prefix('-')
        .map_or((false, sort), |rest| (true, rest));

    docs.sort_by(|a, b| {
        let ordering = match field {
            "title" => a.title.cmp(&b.title),
            "dueDate" => a.due_date.cmp(&b.due_date),
            "assignee" => a.assignee.cmp(&b.assignee),
            "status" => a.status.to_string().cmp(&b.status.to_string()),
            _ => a.created_at.cmp(&b.created_at),
        };
        // Ties break on creation order so pagination stays stable.
        let ordering = ordering.then_with(|| a.created_at.cmp(&b.created_at));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}
