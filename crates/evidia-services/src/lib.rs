//! Evidia Services Library
//!
//! The ingestion coordinator (three-phase upload protocol with state-machine
//! enforcement) and the report counter reconciler. Both are constructed with
//! explicit store handles; there is no ambient global state.

pub mod ingest;
pub mod reconcile;

pub use ingest::{IngestionService, UploadComplete};
pub use reconcile::Reconciler;
