//! HTTP handlers for the ingestion pipeline.

pub mod finalize;
pub mod health;
pub mod initiate;
pub mod transfer;
pub mod upload;
