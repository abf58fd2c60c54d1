//! HTTP blob store client.
//!
//! Speaks the remote store's fixed two-endpoint contract: an authenticated
//! multipart `POST /files` returning `{filename, url, size}`, and an
//! authenticated `GET /health` liveness check. Credentials are a static
//! pre-shared key sent as a bearer credential.
//!
//! The store call enforces a bounded timeout (30s by default). No retries are
//! performed here; retry policy belongs to the caller.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::traits::{BlobStore, BlobStoreError, BlobStoreResult, StoredBlob};

const ERROR_BODY_SNIPPET_LEN: usize = 200;

#[derive(Debug, Deserialize)]
struct StoreResponse {
    filename: String,
    url: String,
    size: i64,
}

/// reqwest-backed blob store client.
#[derive(Clone, Debug)]
pub struct HttpBlobStore {
    client: Client,
    base_url: Url,
    api_key: String,
    timeout: Duration,
}

impl HttpBlobStore {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> BlobStoreResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BlobStoreError::Config(format!("Invalid blob store URL: {}", e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BlobStoreError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> BlobStoreResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BlobStoreError::Config(format!("Invalid endpoint path {}: {}", path, e)))
    }

    /// A relative reference from the remote store is useless outside the
    /// original request context; resolve it against the base URL so only
    /// absolute references leave this client.
    fn normalize_url(&self, reference: &str) -> BlobStoreResult<String> {
        self.base_url
            .join(reference)
            .map(|url| url.to_string())
            .map_err(|e| {
                BlobStoreError::InvalidResponse(format!(
                    "Unresolvable storage reference '{}': {}",
                    reference, e
                ))
            })
    }

    fn map_send_error(&self, err: reqwest::Error) -> BlobStoreError {
        if err.is_timeout() {
            BlobStoreError::Timeout(format!("{:?} elapsed", self.timeout))
        } else {
            BlobStoreError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    #[tracing::instrument(skip(self, data), fields(filename = %filename, size = data.len()))]
    async fn store(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> BlobStoreResult<StoredBlob> {
        let part = Part::stream(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| BlobStoreError::Config(format!("Invalid content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("files")?)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_SNIPPET_LEN).collect();
            tracing::warn!(status = status.as_u16(), body = %snippet, "Blob store rejected upload");
            return Err(BlobStoreError::Rejected {
                status: status.as_u16(),
                message: snippet,
            });
        }

        let parsed: StoreResponse = response
            .json()
            .await
            .map_err(|e| BlobStoreError::InvalidResponse(e.to_string()))?;

        Ok(StoredBlob {
            filename: parsed.filename,
            url: self.normalize_url(&parsed.url)?,
            size: parsed.size,
        })
    }

    async fn ping(&self) -> BlobStoreResult<()> {
        let response = self
            .client
            .get(self.endpoint("health")?)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(BlobStoreError::Rejected {
                status: response.status().as_u16(),
                message: "health check failed".to_string(),
            })
        }
    }
}
