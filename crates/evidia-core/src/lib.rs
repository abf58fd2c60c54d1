//! Evidia Core Library
//!
//! This crate provides core domain models, error types, configuration, and the
//! capability token codec shared across all Evidia components. It performs no I/O.

pub mod config;
pub mod error;
pub mod models;
pub mod token;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use token::{TokenClaims, TokenCodec, TOKEN_TTL};
