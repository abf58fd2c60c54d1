//! Application state.
//!
//! All service handles are explicitly constructed during setup and injected
//! here; no component reaches for ambient global state.

use std::sync::Arc;

use evidia_core::Config;
use evidia_services::IngestionService;
use evidia_storage::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub ingestion: Arc<IngestionService>,
    /// Kept alongside the coordinator for the health check's liveness probe.
    pub blobs: Arc<dyn BlobStore>,
}
