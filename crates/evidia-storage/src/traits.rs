//! Blob store abstraction trait
//!
//! The only component that talks to the outside network. Retry policy belongs
//! to the caller: this client surfaces each failure exactly once, with the
//! failure kind preserved so timeouts, transport errors, and remote rejections
//! stay distinguishable in logs and provenance.

use async_trait::async_trait;
use bytes::Bytes;
use evidia_core::AppError;
use thiserror::Error;

/// Blob store operation errors
#[derive(Debug, Error)]
pub enum BlobStoreError {
    /// The remote store did not answer within the bounded timeout.
    #[error("Blob store timed out after {0}")]
    Timeout(String),

    /// Transport-level failure (connect, TLS, reset).
    #[error("Blob store unreachable: {0}")]
    Unavailable(String),

    /// The remote store answered with a non-success response.
    #[error("Blob store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The remote store answered 2xx but the body violated the contract.
    #[error("Malformed blob store response: {0}")]
    InvalidResponse(String),

    /// Client misconfiguration (bad base URL, unbuildable request).
    #[error("Blob store client configuration error: {0}")]
    Config(String),
}

impl From<BlobStoreError> for AppError {
    fn from(err: BlobStoreError) -> Self {
        match err {
            BlobStoreError::Timeout(msg) => AppError::RemoteTimeout(msg),
            BlobStoreError::Unavailable(msg) => AppError::RemoteUnavailable(msg),
            BlobStoreError::Rejected { status, message } => {
                AppError::RemoteRejected(format!("{}: {}", status, message))
            }
            BlobStoreError::InvalidResponse(msg) => AppError::RemoteUnavailable(msg),
            BlobStoreError::Config(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type for blob store operations
pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

/// The remote store's answer to a successful store call. `url` is always
/// absolute by the time it leaves this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub filename: String,
    pub url: String,
    pub size: i64,
}

/// Narrow contract to the external object store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Hand the bytes to the remote store and get back its reference.
    async fn store(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> BlobStoreResult<StoredBlob>;

    /// Liveness check against the remote store.
    async fn ping(&self) -> BlobStoreResult<()>;
}
