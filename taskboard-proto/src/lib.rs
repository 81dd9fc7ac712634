//! Shared wire-format definitions for the Taskboard REST API.
//!
//! Both the client gateway and the server speak these JSON shapes. The
//! internal client model lives in the `taskboard` crate; everything here
//! is the over-the-wire representation only.

pub mod query;
pub mod record;
