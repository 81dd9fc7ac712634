//! Taskboard API server library.
//!
//! Exposes the task store and HTTP routes for use in tests and embedding.
//! The server keeps tasks in memory and serves the paginated, filtered
//! collection the Taskboard client consumes.

pub mod config;
pub mod routes;
pub mod store;
