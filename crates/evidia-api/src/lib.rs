//! Evidia API library
//!
//! HTTP surface of the ingestion pipeline. Exposed as a library so
//! integration tests can build the router against the in-memory backends.

pub mod api_doc;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod setup;
pub mod state;
