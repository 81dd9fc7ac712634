//! Taskboard client core library.
//!
//! Keeps a normalized in-memory task cache consistent with a paginated,
//! filtered, server-backed collection. The pieces:
//!
//! - [`model`] — internal task and page-query types.
//! - [`adapter`] — pure wire <-> internal mapping.
//! - [`store`] — the normalized snapshot reducer and its shared handle.
//! - [`coordinator`] — debounced query inputs -> coalesced load requests.
//! - [`reconcile`] — post-mutation pagination correction.
//! - [`gateway`] — the remote gateway contract and its HTTP implementation.
//! - [`config`] — layered client configuration.

pub mod adapter;
pub mod config;
pub mod coordinator;
pub mod gateway;
pub mod model;
pub mod reconcile;
pub mod store;
