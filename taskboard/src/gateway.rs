//! Remote task gateway: the only component that performs network I/O.
//!
//! [`TaskGateway`] is the contract the coordinator and reconciler consume;
//! [`HttpGateway`] implements it over the Taskboard REST API. Everything
//! above this boundary treats a call as fails-with-[`GatewayError`] /
//! succeeds-with-data and never retries on its own.

use taskboard_proto::query::ListParams;
use taskboard_proto::record::{ErrorBody, RemoveReceipt, WireDraft, WirePage, WirePatch, WireRecord};
use url::Url;

use crate::model::PageQuery;

/// Gateway failure taxonomy.
///
/// `Validation` and `Conflict` are user-correctable and surfaced inline by
/// callers; `NotFound` means the target vanished between view and action;
/// `Network`/`Server` are transient or server-side failures surfaced via
/// the store's error field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The server rejected the body with field-level messages.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A duplicate resource already exists.
    #[error("task already exists")]
    Conflict,

    /// The target id does not exist (any more).
    #[error("task not found")]
    NotFound,

    /// The request never produced a server response.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with an unexpected error status.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
    },
}

/// Contract for the remote task collection.
///
/// All methods are one-shot: no retries, no caching. Timeout behavior is
/// the implementation's concern; callers only distinguish success from
/// failure.
pub trait TaskGateway: Send + Sync {
    /// Fetches one page of tasks plus the full matching count.
    fn list(
        &self,
        query: &PageQuery,
    ) -> impl std::future::Future<Output = Result<WirePage, GatewayError>> + Send;

    /// Creates a task; the server assigns the id.
    fn create(
        &self,
        draft: &WireDraft,
    ) -> impl std::future::Future<Output = Result<WireRecord, GatewayError>> + Send;

    /// Fully replaces the task with the given id.
    fn replace(
        &self,
        id: &str,
        full: &WireDraft,
    ) -> impl std::future::Future<Output = Result<WireRecord, GatewayError>> + Send;

    /// Applies a partial update to the task with the given id.
    fn patch(
        &self,
        id: &str,
        partial: &WirePatch,
    ) -> impl std::future::Future<Output = Result<WireRecord, GatewayError>> + Send;

    /// Deletes the task with the given id, returning the remaining count.
    fn remove(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<RemoveReceipt, GatewayError>> + Send;
}

/// [`TaskGateway`] implementation over the REST API.
pub struct HttpGateway {
    client: reqwest::Client,
    base: String,
}

impl HttpGateway {
    /// Creates a gateway against the given API base URL
    /// (e.g. `http://127.0.0.1:4000/api`).
    ///
    /// # Errors
    ///
    /// Returns the parse error if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            client: reqwest::Client::new(),
            base: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/tasks", self.base)
    }

    fn resource_url(&self, id: &str) -> String {
        format!("{}/tasks/{id}", self.base)
    }
}

impl TaskGateway for HttpGateway {
    async fn list(&self, query: &PageQuery) -> Result<WirePage, GatewayError> {
        let response = self
            .client
            .get(self.collection_url())
            .query(&ListParams::from(query))
            .send()
            .await?;
        decode(response).await
    }

    async fn create(&self, draft: &WireDraft) -> Result<WireRecord, GatewayError> {
        let response = self
            .client
            .post(self.collection_url())
            .json(draft)
            .send()
            .await?;
        decode(response).await
    }

    async fn replace(&self, id: &str, full: &WireDraft) -> Result<WireRecord, GatewayError> {
        let response = self
            .client
            .put(self.resource_url(id))
            .json(full)
            .send()
            .await?;
        decode(response).await
    }

    async fn patch(&self, id: &str, partial: &WirePatch) -> Result<WireRecord, GatewayError> {
        let response = self
            .client
            .patch(self.resource_url(id))
            .json(partial)
            .send()
            .await?;
        decode(response).await
    }

    async fn remove(&self, id: &str) -> Result<RemoveReceipt, GatewayError> {
        let response = self.client.delete(self.resource_url(id)).send().await?;
        decode(response).await
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Decodes a successful body, or maps an error status to the taxonomy.
async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.json::<ErrorBody>().await.unwrap_or(ErrorBody {
        message: status.to_string(),
        errors: None,
    });
    tracing::debug!(status = status.as_u16(), message = %body.message, "gateway request failed");

    Err(match status.as_u16() {
        400 => GatewayError::Validation(body.errors.unwrap_or_else(|| vec![body.message])),
        404 => GatewayError::NotFound,
        409 => GatewayError::Conflict,
        code => GatewayError::Server {
            status: code,
            message: body.message,
        },
    })
}
