//! Data models for the ingestion pipeline
//!
//! Organized by domain: the attachment record and its lifecycle, the owning
//! report's derived counters, and the wire request/response bodies.

mod attachment;
mod report;
mod requests;

pub use attachment::*;
pub use report::*;
pub use requests::*;
