//! Evidia Record Store Library
//!
//! Durable storage for attachment records and report media counters, behind
//! the `AttachmentStore`/`ReportStore` traits so the coordinator can run
//! against either backend:
//!
//! - `postgres`: sqlx over `PgPool`, one row per attachment, provenance as a
//!   JSONB array. Every status write is a single conditional `UPDATE ... WHERE
//!   status = ...`, never a read-then-write.
//! - `memory`: an in-process map with the same compare-and-swap semantics,
//!   used by tests and local development.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::{PgAttachmentStore, PgReportStore};
pub use store::{AttachmentStore, ReportStore};
