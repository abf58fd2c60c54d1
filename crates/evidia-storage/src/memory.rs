//! In-memory blob store.
//!
//! Non-network backend behind the same trait, used by tests and the `memory`
//! service backend. Failures can be scripted per call so coordinator tests can
//! exercise every remote failure kind without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::traits::{BlobStore, BlobStoreError, BlobStoreResult, StoredBlob};

/// Failure to inject on the next `store` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Timeout,
    Unavailable,
    Rejected,
}

#[derive(Default)]
struct Inner {
    blobs: HashMap<String, Vec<u8>>,
    next_failure: Option<FailureMode>,
}

/// In-process blob store.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    base_url: String,
    inner: Arc<Mutex<Inner>>,
    counter: Arc<AtomicU64>,
}

impl MemoryBlobStore {
    /// `base_url` is the prefix stored blobs are addressed under, e.g.
    /// "https://blobs.test".
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            inner: Arc::default(),
            counter: Arc::default(),
        }
    }

    /// Make the next `store` call fail with the given kind.
    pub async fn fail_next(&self, mode: FailureMode) {
        self.inner.lock().await.next_failure = Some(mode);
    }

    /// Number of blobs currently held, for test assertions.
    pub async fn blob_count(&self) -> usize {
        self.inner.lock().await.blobs.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(
        &self,
        data: Bytes,
        filename: &str,
        _content_type: &str,
    ) -> BlobStoreResult<StoredBlob> {
        let mut inner = self.inner.lock().await;
        if let Some(mode) = inner.next_failure.take() {
            return Err(match mode {
                FailureMode::Timeout => BlobStoreError::Timeout("30s elapsed".to_string()),
                FailureMode::Unavailable => {
                    BlobStoreError::Unavailable("connection refused".to_string())
                }
                FailureMode::Rejected => BlobStoreError::Rejected {
                    status: 422,
                    message: "upload rejected".to_string(),
                },
            });
        }

        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        let remote_filename = format!("{}-{}", sequence, filename);
        let size = data.len() as i64;
        inner.blobs.insert(remote_filename.clone(), data.to_vec());

        Ok(StoredBlob {
            url: format!("{}/{}", self.base_url, remote_filename),
            filename: remote_filename,
            size,
        })
    }

    async fn ping(&self) -> BlobStoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_returns_absolute_url() {
        let store = MemoryBlobStore::new("https://blobs.test/");
        let blob = store
            .store(Bytes::from_static(b"abc"), "photo.jpg", "image/jpeg")
            .await
            .unwrap();
        assert_eq!(blob.url, format!("https://blobs.test/{}", blob.filename));
        assert_eq!(blob.size, 3);
        assert_eq!(store.blob_count().await, 1);
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let store = MemoryBlobStore::new("https://blobs.test");
        store.fail_next(FailureMode::Timeout).await;

        let err = store
            .store(Bytes::from_static(b"abc"), "a.jpg", "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, BlobStoreError::Timeout(_)));
        assert_eq!(store.blob_count().await, 0);

        // Next call succeeds: failures are single-shot.
        store
            .store(Bytes::from_static(b"abc"), "a.jpg", "image/jpeg")
            .await
            .unwrap();
    }
}
