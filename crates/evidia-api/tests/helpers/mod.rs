//! Test helpers: build the router over the in-memory backends.
//!
//! Run with: `cargo test -p evidia-api`. No external services needed; the
//! record store and blob store are both in-process.

use axum_test::TestServer;
use bytes::Bytes;
use evidia_api::setup::routes;
use evidia_api::state::AppState;
use evidia_core::config::StoreBackend;
use evidia_core::{Config, TokenCodec};
use evidia_db::MemoryStore;
use evidia_services::IngestionService;
use evidia_storage::MemoryBlobStore;
use std::sync::Arc;
use uuid::Uuid;

pub const BLOB_BASE_URL: &str = "http://blobs.test/files";

/// Test application: server plus handles on the in-memory backends for
/// seeding and assertions.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
}

impl TestApp {
    /// Seed a report row and return its ID.
    pub async fn seed_report(&self) -> Uuid {
        let report_id = Uuid::new_v4();
        self.store.add_report(report_id).await;
        report_id
    }
}

fn test_config() -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        store_backend: StoreBackend::Memory,
        database_url: None,
        db_max_connections: 5,
        db_timeout_seconds: 5,
        token_secret: "integration-test-secret-key".to_string(),
        blob_store_url: BLOB_BASE_URL.to_string(),
        blob_store_api_key: "test-api-key".to_string(),
        blob_store_timeout_seconds: 5,
        max_upload_bytes: 10 * 1024 * 1024,
    }
}

/// Setup a test app over the memory store and memory blob store.
pub fn setup_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new(BLOB_BASE_URL));

    let tokens = TokenCodec::new(config.token_secret.as_bytes().to_vec());
    let ingestion = Arc::new(IngestionService::new(
        store.clone(),
        store.clone(),
        blobs.clone(),
        tokens,
    ));

    let state = Arc::new(AppState {
        config: config.clone(),
        ingestion,
        blobs: blobs.clone(),
    });

    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        store,
        blobs,
    }
}

pub const MULTIPART_BOUNDARY: &str = "evidia-test-boundary";

/// Hand-rolled multipart/form-data body for the single-call upload endpoint.
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                MULTIPART_BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                MULTIPART_BOUNDARY, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn build(mut self) -> Bytes {
        self.body
            .extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
        Bytes::from(self.body)
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY)
    }
}
