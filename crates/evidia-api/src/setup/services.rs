//! Service initialization and application state setup

use anyhow::{Context, Result};
use evidia_core::config::StoreBackend;
use evidia_core::{Config, TokenCodec};
use evidia_db::{AttachmentStore, MemoryStore, PgAttachmentStore, PgReportStore, ReportStore};
use evidia_services::IngestionService;
use evidia_storage::{BlobStore, HttpBlobStore};
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

/// Build the store backends, the blob store client, and the coordinator.
pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let (attachments, reports): (Arc<dyn AttachmentStore>, Arc<dyn ReportStore>) =
        match config.store_backend {
            StoreBackend::Postgres => {
                let pool = super::database::setup_database(config).await?;
                (
                    Arc::new(PgAttachmentStore::new(pool.clone())),
                    Arc::new(PgReportStore::new(pool)),
                )
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store backend, records will not survive restart");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
        };

    let blobs: Arc<dyn BlobStore> = Arc::new(
        HttpBlobStore::new(
            &config.blob_store_url,
            config.blob_store_api_key.clone(),
            Duration::from_secs(config.blob_store_timeout_seconds),
        )
        .context("Failed to initialize blob store client")?,
    );
    tracing::info!(
        blob_store_url = %config.blob_store_url,
        timeout_seconds = config.blob_store_timeout_seconds,
        "Blob store client initialized"
    );

    let tokens = TokenCodec::new(config.token_secret.as_bytes().to_vec());
    let ingestion = Arc::new(IngestionService::new(attachments, reports, blobs.clone(), tokens));

    Ok(Arc::new(AppState {
        config: config.clone(),
        ingestion,
        blobs,
    }))
}
