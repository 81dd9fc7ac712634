//! HTTP surface of the task API.
//!
//! REST routes over the in-memory [`TaskStore`]:
//!
//! - `GET    /api/tasks`       — paged, filtered listing
//! - `POST   /api/tasks`       — create (201)
//! - `PUT    /api/tasks/{id}`  — full replace
//! - `PATCH  /api/tasks/{id}`  — partial update
//! - `DELETE /api/tasks/{id}`  — delete, returns the remaining count
//!
//! Errors map to `400` (validation, with field messages), `409` (duplicate
//! title), and `404` (unknown id), each with a JSON `{message, errors?}`
//! body.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use taskboard_proto::query::ListParams;
use taskboard_proto::record::{ErrorBody, RemoveReceipt, WireDraft, WirePage, WirePatch, WireRecord};

use crate::store::{StoreError, TaskStore};

/// Builds the API router over a shared store.
pub fn router(store: Arc<TaskStore>) -> axum::Router {
    axum::Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            axum::routing::put(replace_task)
                .patch(patch_task)
                .delete(delete_task),
        )
        .with_state(store)
}

/// Starts the server on the given address and returns the bound address and
/// a join handle.
///
/// This is the entry point used by both `main.rs` and test code; bind to
/// `127.0.0.1:0` for an OS-assigned port in tests.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    store: Arc<TaskStore>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(store);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task server error");
        }
    });

    Ok((bound_addr, handle))
}

async fn list_tasks(
    State(store): State<Arc<TaskStore>>,
    Query(params): Query<ListParams>,
) -> Json<WirePage> {
    let page = store.query(&params).await;
    tracing::debug!(
        page = params.page,
        page_size = params.page_size,
        total = page.total,
        returned = page.tasks.len(),
        "listing tasks"
    );
    Json(page)
}

async fn create_task(
    State(store): State<Arc<TaskStore>>,
    Json(draft): Json<WireDraft>,
) -> Result<(StatusCode, Json<WireRecord>), ApiError> {
    let record = store.insert(&draft).await?;
    tracing::info!(id = %record.id, title = %record.title, "task created");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn replace_task(
    State(store): State<Arc<TaskStore>>,
    Path(id): Path<String>,
    Json(draft): Json<WireDraft>,
) -> Result<Json<WireRecord>, ApiError> {
    let record = store.replace(&id, &draft).await?;
    tracing::info!(id = %id, "task replaced");
    Ok(Json(record))
}

async fn patch_task(
    State(store): State<Arc<TaskStore>>,
    Path(id): Path<String>,
    Json(patch): Json<WirePatch>,
) -> Result<Json<WireRecord>, ApiError> {
    let record = store.patch(&id, &patch).await?;
    tracing::info!(id = %id, "task patched");
    Ok(Json(record))
}

async fn delete_task(
    State(store): State<Arc<TaskStore>>,
    Path(id): Path<String>,
) -> Result<Json<RemoveReceipt>, ApiError> {
    let total = store.remove(&id).await?;
    tracing::info!(id = %id, total, "task deleted");
    Ok(Json(RemoveReceipt {
        message: format!("Task {id} deleted"),
        total,
    }))
}

/// Response-side wrapper for [`StoreError`].
struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            StoreError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: "validation failed".to_string(),
                    errors: Some(errors),
                },
            ),
            StoreError::DuplicateTitle => (
                StatusCode::CONFLICT,
                ErrorBody {
                    message: self.0.to_string(),
                    errors: None,
                },
            ),
            StoreError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    message: self.0.to_string(),
                    errors: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
