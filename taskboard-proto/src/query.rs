//! List-endpoint query parameters.
//!
//! The same struct serves both directions: the client gateway serializes
//! it into the request query string and the server deserializes it from
//! the incoming request. Absent parameters fall back to the documented
//! defaults (page 1, page size 5, newest-first sort, no filter).

use serde::{Deserialize, Serialize};

/// Default page size when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Default sort: newest first by creation time.
pub const DEFAULT_SORT: &str = "-createdAt";

/// Query parameters accepted by `GET /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// 1-based page index.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of records per page.
    #[serde(rename = "pageSize", default = "default_page_size")]
    pub page_size: u32,
    /// Case-insensitive substring match over title/description/assignee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Exact status match (`TODO`, `IN_PROGRESS`, `DONE`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Sort field, optionally prefixed with `-` for descending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

const fn default_page() -> u32 {
    1
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            filter: None,
            status: None,
            sort: None,
        }
    }
}
