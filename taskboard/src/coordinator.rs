//! Query coordinator: turns independently-changing view inputs into a
//! minimal, correctly-ordered series of load requests.
//!
//! The coordinator runs as a background tokio task consuming
//! [`QueryInput`] events. Free-text and status filters are debounced over
//! a settle window and deduplicated against their previous settled value;
//! a settled change resets the page to 1. Page and page-size clicks apply
//! immediately, except while a filter debounce is pending (the pending
//! reset supersedes them, last-writer-wins). Exactly one request is
//! issued per distinct settled query tuple.
//!
//! Loads carry a generation counter. A completion whose generation is not
//! the latest issued one is discarded on arrival, so the store only ever
//! reflects the most recently *issued* request, regardless of response
//! arrival order. Superseded requests are not cancelled at the transport.
//!
//! Teardown is scoped: closing the input channel (dropping the handle's
//! sender) ends the background task.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::OptionFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::adapter;
use crate::gateway::TaskGateway;
use crate::model::{PageQuery, Task, TaskStatus};
use crate::store::{StoreEvent, StoreHandle};

/// Default settle window for debounced filter inputs.
pub const DEFAULT_SETTLE_WINDOW: Duration = Duration::from_millis(300);

/// Default capacity for the input and completion channels.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// View inputs consumed by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    /// Free-text filter keystroke (debounced).
    FilterText(String),
    /// Status filter change (debounced).
    Status(Option<TaskStatus>),
    /// Page click (immediate, 1-based).
    Page(u32),
    /// Page-size change (immediate).
    PageSize(u32),
    /// Reconciler-corrected page after a mutation. Applies immediately
    /// and reloads even if the query tuple is unchanged, since the
    /// server-side collection has changed underneath it.
    Refresh {
        /// The page to display, 1-based.
        page: u32,
    },
}

/// Coordinator tuning knobs.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long a debounced input must stay unchanged before settling.
    pub settle_window: Duration,
    /// Capacity of the input/completion channels.
    pub channel_capacity: usize,
    /// The query to load on startup.
    pub initial: PageQuery,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settle_window: DEFAULT_SETTLE_WINDOW,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            initial: PageQuery::default(),
        }
    }
}

/// Handle returned by [`spawn`].
///
/// Dropping `inputs` (the last sender) shuts the coordinator down; `task`
/// can be awaited for teardown.
pub struct CoordinatorHandle {
    /// Sender for view inputs.
    pub inputs: mpsc::Sender<QueryInput>,
    /// Watch over the effective query (page math readers use this).
    pub query: watch::Receiver<PageQuery>,
    /// The background task.
    pub task: JoinHandle<()>,
}

/// Outcome of one issued load, tagged with its generation.
struct LoadOutcome {
    generation: u64,
    result: Result<(Vec<Task>, u64), String>,
}

/// Spawns the coordinator over the given store and gateway.
///
/// The initial query is loaded immediately.
pub fn spawn<G: TaskGateway + 'static>(
    config: CoordinatorConfig,
    store: StoreHandle,
    gateway: Arc<G>,
) -> CoordinatorHandle {
    let (input_tx, input_rx) = mpsc::channel(config.channel_capacity);
    let (completion_tx, completion_rx) = mpsc::channel(config.channel_capacity);
    let (query_tx, query_rx) = watch::channel(config.initial.clone());

    let coordinator = Coordinator {
        settle_window: config.settle_window,
        store,
        gateway,
        effective: config.initial,
        pending_filter: None,
        pending_status: None,
        last_issued: None,
        generation: 0,
        completion_tx,
        query_tx,
    };

    let task = tokio::spawn(coordinator.run(input_rx, completion_rx));

    CoordinatorHandle {
        inputs: input_tx,
        query: query_rx,
        task,
    }
}

struct Coordinator<G> {
    settle_window: Duration,
    store: StoreHandle,
    gateway: Arc<G>,
    /// The current settled query.
    effective: PageQuery,
    /// Debounced filter text awaiting its settle deadline.
    pending_filter: Option<(String, Instant)>,
    /// Debounced status filter awaiting its settle deadline.
    pending_status: Option<(Option<TaskStatus>, Instant)>,
    /// The tuple of the most recently issued load, for dedup.
    last_issued: Option<PageQuery>,
    /// Generation of the most recently issued load.
    generation: u64,
    completion_tx: mpsc::Sender<LoadOutcome>,
    query_tx: watch::Sender<PageQuery>,
}

impl<G: TaskGateway + 'static> Coordinator<G> {
    async fn run(
        mut self,
        mut input_rx: mpsc::Receiver<QueryInput>,
        mut completion_rx: mpsc::Receiver<LoadOutcome>,
    ) {
        self.issue_load(false);

        loop {
            let timer: OptionFuture<_> = self.next_deadline().map(tokio::time::sleep_until).into();
            tokio::select! {
                maybe_input = input_rx.recv() => match maybe_input {
                    Some(input) => self.on_input(input),
                    None => break,
                },
                Some(outcome) = completion_rx.recv() => self.on_completion(outcome),
                Some(()) = timer => self.on_settle(),
            }
        }

        tracing::debug!("query coordinator shutting down");
    }

    /// Earliest pending settle deadline, if any input is debouncing.
    fn next_deadline(&self) -> Option<Instant> {
        let filter = self.pending_filter.as_ref().map(|(_, d)| *d);
        let status = self.pending_status.as_ref().map(|(_, d)| *d);
        match (filter, status) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn debounce_pending(&self) -> bool {
        self.pending_filter.is_some() || self.pending_status.is_some()
    }

    fn on_input(&mut self, input: QueryInput) {
        match input {
            QueryInput::FilterText(text) => {
                self.pending_filter = Some((text, Instant::now() + self.settle_window));
            }
            QueryInput::Status(status) => {
                self.pending_status = Some((status, Instant::now() + self.settle_window));
            }
            QueryInput::Page(page) => {
                if self.debounce_pending() {
                    tracing::debug!(page, "page change ignored while a filter settles");
                } else {
                    self.effective.page = page.max(1);
                    self.issue_load(false);
                }
            }
            QueryInput::PageSize(size) => {
                if self.debounce_pending() {
                    tracing::debug!(size, "page-size change ignored while a filter settles");
                } else if size > 0 {
                    self.effective.page_size = size;
                    self.issue_load(false);
                }
            }
            QueryInput::Refresh { page } => {
                self.effective.page = page.max(1);
                self.issue_load(true);
            }
        }
    }

    /// Settles whichever debounced inputs have reached their deadline.
    ///
    /// A settled value equal to the previous settled value is dropped
    /// without a request; any real change resets the page to 1.
    fn on_settle(&mut self) {
        let now = Instant::now();
        let mut changed = false;

        if let Some((text, deadline)) = self.pending_filter.take() {
            if deadline <= now {
                if text != self.effective.filter_text {
                    self.effective.filter_text = text;
                    changed = true;
                }
            } else {
                self.pending_filter = Some((text, deadline));
            }
        }

        if let Some((status, deadline)) = self.pending_status.take() {
            if deadline <= now {
                if status != self.effective.status {
                    self.effective.status = status;
                    self.store.apply(StoreEvent::SetFilterStatus(status));
                    changed = true;
                }
            } else {
                self.pending_status = Some((status, deadline));
            }
        }

        if changed {
            self.effective.page = 1;
            self.issue_load(false);
        }
    }

    /// Issues a load for the current effective query.
    ///
    /// Identical consecutive tuples are not re-fetched unless `force` is
    /// set (post-mutation refresh). Each load bumps the generation; the
    /// completion handler drops anything older.
    fn issue_load(&mut self, force: bool) {
        if !force && self.last_issued.as_ref() == Some(&self.effective) {
            tracing::debug!("query tuple unchanged, skipping fetch");
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        self.last_issued = Some(self.effective.clone());
        self.query_tx.send_replace(self.effective.clone());
        self.store.apply(StoreEvent::BeginLoad);

        tracing::debug!(
            generation,
            page = self.effective.page,
            page_size = self.effective.page_size,
            filter = %self.effective.filter_text,
            "issuing load"
        );

        let gateway = Arc::clone(&self.gateway);
        let query = self.effective.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = match gateway.list(&query).await {
                Ok(page) => {
                    let total = page.total;
                    page.tasks
                        .iter()
                        .map(adapter::from_wire)
                        .collect::<Result<Vec<_>, _>>()
                        .map(|tasks| (tasks, total))
                        .map_err(|e| e.to_string())
                }
                Err(e) => Err(e.to_string()),
            };
            // Receiver gone means the coordinator shut down; nothing to do.
            let _ = tx.send(LoadOutcome { generation, result }).await;
        });
    }

    /// Applies a load outcome, unless a newer request has been issued.
    fn on_completion(&mut self, outcome: LoadOutcome) {
        if outcome.generation != self.generation {
            tracing::debug!(
                stale = outcome.generation,
                current = self.generation,
                "discarding stale load completion"
            );
            return;
        }
        match outcome.result {
            Ok((tasks, total)) => self.store.apply(StoreEvent::LoadSucceeded { tasks, total }),
            Err(message) => self.store.apply(StoreEvent::LoadFailed(message)),
        }
    }
}
