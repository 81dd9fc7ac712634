//! Normalized task store: the single authoritative in-memory view of what
//! the last successful load or mutation returned.
//!
//! [`Snapshot`] is a value; every transition is a pure reducer
//! (`old snapshot + event -> new snapshot`) so sequences of events can be
//! replayed and inspected trivially in tests. [`StoreHandle`] is the
//! shared wrapper the rest of the client holds: all writes go through
//! [`StoreHandle::apply`], and views re-derive from the published
//! snapshot via [`StoreHandle::subscribe`].
//!
//! Invariants enforced by every transition:
//! - `order` is exactly the key set of `entities`, each id once.
//! - `total` reflects the server-side count for the current query, never
//!   `entities.len()`.
//! - `error` implies not `loading`.
//! - `selected_id`, when set, references a present entity.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::model::{Task, TaskStatus};

/// A successful mutation outcome, as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A new task was created; the gateway assigned its id.
    Created(Task),
    /// A task was fully replaced.
    Updated(Task),
    /// A task was partially updated.
    Patched(Task),
    /// A task was deleted.
    Removed(String),
}

/// Events accepted by the snapshot reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A load request was issued. Keeps last-good entities visible.
    BeginLoad,
    /// A load completed; replaces the page contents wholesale.
    LoadSucceeded {
        /// The page's tasks in server order.
        tasks: Vec<Task>,
        /// Full matching count for the current query.
        total: u64,
    },
    /// A load (or mutation, which shares the same surface) failed.
    LoadFailed(String),
    /// A mutation was confirmed by the gateway.
    MutationSucceeded(Mutation),
    /// Change the selected task. Silently ignored for absent ids.
    Select(Option<String>),
    /// Record the active status filter (does not itself trigger a fetch).
    SetFilterStatus(Option<TaskStatus>),
}

/// The normalized store state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Entity cache, keyed by task id.
    pub entities: HashMap<String, Task>,
    /// Server-provided order of the current page; never re-sorted locally.
    pub order: Vec<String>,
    /// Server-side count for the current query across all pages.
    pub total: u64,
    /// Whether a load is in flight.
    pub loading: bool,
    /// Last failure message, if the most recent operation failed.
    pub error: Option<String>,
    /// Currently selected task id, if any.
    pub selected_id: Option<String>,
    /// Active status filter, mirrored for view derivation.
    pub filter_status: Option<TaskStatus>,
}

impl Snapshot {
    /// Applies one event, producing the next snapshot.
    #[must_use]
    pub fn apply(mut self, event: StoreEvent) -> Self {
        match event {
            StoreEvent::BeginLoad => {
                self.loading = true;
                self.error = None;
            }
            StoreEvent::LoadSucceeded { tasks, total } => {
                self.order = tasks.iter().map(|t| t.id.clone()).collect();
                self.entities = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
                self.total = total;
                self.loading = false;
                self.error = None;
                // A wholesale page replace may drop the selected entity.
                if let Some(id) = &self.selected_id
                    && !self.entities.contains_key(id)
                {
                    self.selected_id = None;
                }
            }
            StoreEvent::LoadFailed(message) => {
                self.loading = false;
                self.error = Some(message);
            }
            StoreEvent::MutationSucceeded(mutation) => match mutation {
                Mutation::Created(task) | Mutation::Updated(task) | Mutation::Patched(task) => {
                    self.upsert(task);
                }
                Mutation::Removed(id) => self.remove(&id),
            },
            StoreEvent::Select(id) => match id {
                Some(id) if !self.entities.contains_key(&id) => {
                    tracing::debug!(id = %id, "select ignored: id not in store");
                }
                other => self.selected_id = other,
            },
            StoreEvent::SetFilterStatus(status) => self.filter_status = status,
        }
        self
    }

    /// The current page's tasks, in server order.
    #[must_use]
    pub fn tasks_in_order(&self) -> Vec<&Task> {
        self.order
            .iter()
            .filter_map(|id| self.entities.get(id))
            .collect()
    }

    /// The current page's tasks matching the active status filter.
    ///
    /// A freshly loaded page is already server-filtered, so this equals
    /// [`Self::tasks_in_order`] until a local mutation moves a cached task
    /// out of the filtered status; then the task drops from this view
    /// before the follow-up reload lands.
    #[must_use]
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        self.tasks_in_order()
            .into_iter()
            .filter(|t| self.filter_status.is_none_or(|s| t.status == s))
            .collect()
    }

    /// Number of cached tasks with the given status.
    #[must_use]
    pub fn count_by_status(&self, status: TaskStatus) -> usize {
        self.entities
            .values()
            .filter(|t| t.status == status)
            .count()
    }

    /// The selected task, resolved through the entity cache.
    #[must_use]
    pub fn selected_task(&self) -> Option<&Task> {
        self.selected_id.as_ref().and_then(|id| self.entities.get(id))
    }

    /// Upserts a task: existing ids are replaced in place, new ids are
    /// appended at the end of `order` (the next load supersedes the order
    /// anyway).
    fn upsert(&mut self, task: Task) {
        if !self.entities.contains_key(&task.id) {
            self.order.push(task.id.clone());
        }
        self.entities.insert(task.id.clone(), task);
    }

    /// Removes a task and clears the selection if it pointed at it.
    fn remove(&mut self, id: &str) {
        if self.entities.remove(id).is_some() {
            self.order.retain(|o| o != id);
        }
        if self.selected_id.as_deref() == Some(id) {
            self.selected_id = None;
        }
    }
}

/// Shared handle to the store.
///
/// Cheap to clone; all clones see the same snapshot. Reads are
/// synchronous (`snapshot()`); change notification is a `watch` channel
/// so views can await the next state without polling.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Inner>,
}

struct Inner {
    snapshot: RwLock<Snapshot>,
    tx: watch::Sender<Snapshot>,
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreHandle {
    /// Creates a handle over an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self {
            inner: Arc::new(Inner {
                snapshot: RwLock::new(Snapshot::default()),
                tx,
            }),
        }
    }

    /// Applies an event through the reducer and publishes the result.
    ///
    /// The reducer runs to completion under the write lock, so no
    /// partially-applied state is ever observable.
    pub fn apply(&self, event: StoreEvent) {
        let mut guard = self.inner.snapshot.write();
        let next = guard.clone().apply(event);
        *guard = next.clone();
        drop(guard);
        self.inner.tx.send_replace(next);
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot.read().clone()
    }

    /// Subscribes to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.tx.subscribe()
    }
}
