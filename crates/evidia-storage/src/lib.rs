//! Evidia Storage Library
//!
//! The external storage client: a narrow `BlobStore` trait for "store these
//! bytes, return a reference" and "check liveness", plus two backends:
//!
//! - `http`: the production client speaking the remote store's two-endpoint
//!   contract over reqwest (authenticated multipart store call + liveness
//!   check) with a bounded timeout and no retries.
//! - `memory`: an in-process backend with scripted failure injection, used by
//!   tests and the `memory` backend of the service.

pub mod http;
pub mod memory;
pub mod traits;

pub use http::HttpBlobStore;
pub use memory::{FailureMode, MemoryBlobStore};
pub use traits::{BlobStore, BlobStoreError, BlobStoreResult, StoredBlob};
