//! Mutation reconciler: keeps the visible page consistent with server
//! truth after create/update/patch/delete.
//!
//! Every successful mutation decides which page to reload:
//!
//! - create jumps to the new last page, where the server appends;
//! - update/patch stay on the current page;
//! - delete steps back one page when it emptied a page past the first.
//!
//! Failures never commit anything optimistically. Network/server failures
//! surface through the store's error field; a vanished target
//! (`NotFound`) triggers a refresh of the current page; validation and
//! conflict errors are returned to the caller for inline display. No
//! automatic retries.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::adapter::{self, AdapterError};
use crate::coordinator::{CoordinatorHandle, QueryInput};
use crate::gateway::{GatewayError, TaskGateway};
use crate::model::{PageQuery, Task, TaskDraft, TaskPatch};
use crate::store::{Mutation, StoreEvent, StoreHandle};

/// Errors returned from mutation calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// The gateway rejected or failed the call.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The gateway confirmed success but returned a record the adapter
    /// could not map.
    #[error("gateway returned malformed record: {0}")]
    Malformed(#[from] AdapterError),
}

/// Applies mutations through the gateway and corrects pagination.
pub struct MutationReconciler<G> {
    gateway: Arc<G>,
    store: StoreHandle,
    inputs: mpsc::Sender<QueryInput>,
    query: watch::Receiver<PageQuery>,
}

impl<G: TaskGateway> MutationReconciler<G> {
    /// Creates a reconciler wired to the given coordinator.
    #[must_use]
    pub fn new(gateway: Arc<G>, store: StoreHandle, coordinator: &CoordinatorHandle) -> Self {
        Self::with_channels(
            gateway,
            store,
            coordinator.inputs.clone(),
            coordinator.query.clone(),
        )
    }

    /// Creates a reconciler over raw channel halves (used in tests and by
    /// callers that manage the coordinator themselves).
    #[must_use]
    pub const fn with_channels(
        gateway: Arc<G>,
        store: StoreHandle,
        inputs: mpsc::Sender<QueryInput>,
        query: watch::Receiver<PageQuery>,
    ) -> Self {
        Self {
            gateway,
            store,
            inputs,
            query,
        }
    }

    /// Creates a task, then jumps to the last page so the new item
    /// (appended server-side) is visible.
    ///
    /// The last page is computed against the pre-create total from the
    /// store plus one, since the store total only changes on the next
    /// load.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError`] if the gateway call fails or echoes a
    /// malformed record; the store is not modified on failure.
    pub async fn create(&self, draft: &TaskDraft) -> Result<Task, MutationError> {
        let wire = adapter::to_wire(draft);
        match self.gateway.create(&wire).await {
            Ok(record) => {
                let task = adapter::from_wire(&record)?;
                let total_before = self.store.snapshot().total;
                self.store
                    .apply(StoreEvent::MutationSucceeded(Mutation::Created(
                        task.clone(),
                    )));
                let page_size = self.query.borrow().page_size;
                self.request_page(last_page(total_before + 1, page_size))
                    .await;
                Ok(task)
            }
            Err(err) => {
                self.surface(&err).await;
                Err(err.into())
            }
        }
    }

    /// Fully replaces a task and reloads the current page.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError`] if the gateway call fails or echoes a
    /// malformed record; the store is not modified on failure.
    pub async fn replace(&self, id: &str, draft: &TaskDraft) -> Result<Task, MutationError> {
        let wire = adapter::to_wire(draft);
        match self.gateway.replace(id, &wire).await {
            Ok(record) => {
                let task = adapter::from_wire(&record)?;
                self.store
                    .apply(StoreEvent::MutationSucceeded(Mutation::Updated(
                        task.clone(),
                    )));
                self.request_page(self.current_page()).await;
                Ok(task)
            }
            Err(err) => {
                self.surface(&err).await;
                Err(err.into())
            }
        }
    }

    /// Partially updates a task and reloads the current page.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError`] if the gateway call fails or echoes a
    /// malformed record; the store is not modified on failure.
    pub async fn patch(&self, id: &str, patch: &TaskPatch) -> Result<Task, MutationError> {
        let wire = adapter::to_partial_wire(patch);
        match self.gateway.patch(id, &wire).await {
            Ok(record) => {
                let task = adapter::from_wire(&record)?;
                self.store
                    .apply(StoreEvent::MutationSucceeded(Mutation::Patched(
                        task.clone(),
                    )));
                self.request_page(self.current_page()).await;
                Ok(task)
            }
            Err(err) => {
                self.surface(&err).await;
                Err(err.into())
            }
        }
    }

    /// Deletes a task and reloads the corrected page.
    ///
    /// If the deleted task was the only item on the current page and the
    /// current page is not the first, the view moves back one page;
    /// otherwise it stays. Either way the page is reloaded, since the
    /// total has changed. Returns the server's remaining count.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError`] if the gateway call fails; the store is
    /// not modified on failure.
    pub async fn remove(&self, id: &str) -> Result<u64, MutationError> {
        // Decide the target page from the pre-delete snapshot.
        let snapshot = self.store.snapshot();
        let last_on_page = snapshot.entities.len() == 1 && snapshot.entities.contains_key(id);
        let current = self.current_page();
        let target = if last_on_page && current > 1 {
            current - 1
        } else {
            current
        };

        match self.gateway.remove(id).await {
            Ok(receipt) => {
                self.store
                    .apply(StoreEvent::MutationSucceeded(Mutation::Removed(
                        id.to_string(),
                    )));
                self.request_page(target).await;
                Ok(receipt.total)
            }
            Err(err) => {
                self.surface(&err).await;
                Err(err.into())
            }
        }
    }

    fn current_page(&self) -> u32 {
        self.query.borrow().page
    }

    async fn request_page(&self, page: u32) {
        if self
            .inputs
            .send(QueryInput::Refresh { page })
            .await
            .is_err()
        {
            tracing::warn!(page, "coordinator gone, dropping page refresh");
        }
    }

    /// Routes a gateway failure per the error taxonomy.
    async fn surface(&self, err: &GatewayError) {
        match err {
            GatewayError::Network(_) | GatewayError::Server { .. } => {
                self.store.apply(StoreEvent::LoadFailed(err.to_string()));
            }
            GatewayError::NotFound => {
                // Target vanished between view and action; re-sync.
                self.request_page(self.current_page()).await;
            }
            GatewayError::Validation(_) | GatewayError::Conflict => {
                // User-correctable; the caller surfaces these inline.
            }
        }
    }
}

/// Number of the last page for the given total, never below 1.
fn last_page(total: u64, page_size: u32) -> u32 {
    let pages = total.div_ceil(u64::from(page_size.max(1))).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
