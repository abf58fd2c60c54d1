//! Error types module
//!
//! All errors in the ingestion pipeline are unified under the `AppError` enum:
//! capability token failures, state-machine conflicts, the three remote storage
//! failure kinds, reconciliation failures, and the usual database/input errors.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature so non-database crates can build without it.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

use crate::models::AttachmentStatus;
use uuid::Uuid;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like remote hiccups
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STATE_CONFLICT")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    /// Capability token failed signature or structural verification.
    #[error("Invalid capability token: {0}")]
    TokenInvalid(String),

    /// Capability token was well-formed but past its embedded expiry.
    #[error("Capability token expired")]
    TokenExpired,

    /// The attachment is not in the state the phase requires. Signals a
    /// duplicate call, an out-of-order call, or a lost race; the caller must
    /// inspect current state before deciding to retry.
    #[error("Attachment {attachment_id} is {actual}, expected {expected}")]
    StateConflict {
        attachment_id: Uuid,
        expected: AttachmentStatus,
        actual: AttachmentStatus,
    },

    /// Transport-level failure reaching the blob store.
    #[error("Blob store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Blob store did not answer within the bounded timeout.
    #[error("Blob store timed out: {0}")]
    RemoteTimeout(String),

    /// Blob store answered with a non-success response.
    #[error("Blob store rejected the upload: {0}")]
    RemoteRejected(String),

    /// Counter reconciliation failed after a successful finalize. The
    /// attachment stays COMPLETED; the caller retries reconciliation out of band.
    #[error("Counter reconciliation failed for report {report_id}")]
    ReconciliationFailed {
        report_id: Uuid,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, true, LogLevel::Error),
        AppError::TokenInvalid(_) => (401, "TOKEN_INVALID", false, false, LogLevel::Debug),
        AppError::TokenExpired => (401, "TOKEN_EXPIRED", false, false, LogLevel::Debug),
        AppError::StateConflict { .. } => (409, "STATE_CONFLICT", false, false, LogLevel::Debug),
        AppError::RemoteUnavailable(_) => (502, "REMOTE_UNAVAILABLE", true, true, LogLevel::Warn),
        AppError::RemoteTimeout(_) => (504, "REMOTE_TIMEOUT", true, true, LogLevel::Warn),
        AppError::RemoteRejected(_) => (502, "REMOTE_REJECTED", false, false, LogLevel::Warn),
        AppError::ReconciliationFailed { .. } => {
            (500, "RECONCILIATION_FAILED", true, true, LogLevel::Error)
        }
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, false, LogLevel::Debug),
        AppError::Unauthorized(_) => (401, "UNAUTHORIZED", false, false, LogLevel::Debug),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", true, true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::TokenInvalid(_) => "TokenInvalid",
            AppError::TokenExpired => "TokenExpired",
            AppError::StateConflict { .. } => "StateConflict",
            AppError::RemoteUnavailable(_) => "RemoteUnavailable",
            AppError::RemoteTimeout(_) => "RemoteTimeout",
            AppError::RemoteRejected(_) => "RemoteRejected",
            AppError::ReconciliationFailed { .. } => "ReconciliationFailed",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Provenance kind string recorded when a transfer fails with this error.
    pub fn provenance_kind(&self) -> &'static str {
        match self {
            AppError::RemoteUnavailable(_) => "remote_unavailable",
            AppError::RemoteTimeout(_) => "remote_timeout",
            AppError::RemoteRejected(_) => "remote_rejected",
            _ => "error",
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::TokenInvalid(_) => "Invalid capability token".to_string(),
            AppError::TokenExpired => "Capability token expired".to_string(),
            AppError::StateConflict {
                expected, actual, ..
            } => format!("Attachment already processed: {} (expected {})", actual, expected),
            AppError::RemoteUnavailable(_) => "Media storage is unavailable".to_string(),
            AppError::RemoteTimeout(_) => "Media storage timed out".to_string(),
            AppError::RemoteRejected(ref msg) => format!("Media storage rejected the upload: {}", msg),
            AppError::ReconciliationFailed { report_id, .. } => format!(
                "Upload completed but counter reconciliation failed for report {}",
                report_id
            ),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttachmentStatus;

    #[test]
    fn test_error_metadata_state_conflict() {
        let err = AppError::StateConflict {
            attachment_id: Uuid::new_v4(),
            expected: AttachmentStatus::Pending,
            actual: AttachmentStatus::Processing,
        };
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "STATE_CONFLICT");
        assert!(!err.is_recoverable());
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(err.client_message().contains("processing"));
    }

    #[test]
    fn test_error_metadata_token_failures_distinguishable() {
        let invalid = AppError::TokenInvalid("bad signature".to_string());
        let expired = AppError::TokenExpired;
        // Same rejection for callers, different codes in logs.
        assert_eq!(invalid.http_status_code(), expired.http_status_code());
        assert_ne!(invalid.error_code(), expired.error_code());
    }

    #[test]
    fn test_error_metadata_remote_kinds() {
        let timeout = AppError::RemoteTimeout("30s elapsed".to_string());
        assert_eq!(timeout.http_status_code(), 504);
        assert_eq!(timeout.provenance_kind(), "remote_timeout");
        assert!(timeout.is_recoverable());

        let rejected = AppError::RemoteRejected("quota exceeded".to_string());
        assert_eq!(rejected.http_status_code(), 502);
        assert_eq!(rejected.provenance_kind(), "remote_rejected");
        assert!(!rejected.is_recoverable());

        let unavailable = AppError::RemoteUnavailable("connection refused".to_string());
        assert_eq!(unavailable.provenance_kind(), "remote_unavailable");
        assert_eq!(unavailable.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_reconciliation_failed() {
        let report_id = Uuid::new_v4();
        let err = AppError::ReconciliationFailed {
            report_id,
            source: anyhow::anyhow!("pool closed"),
        };
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_recoverable());
        assert!(err.client_message().contains(&report_id.to_string()));
    }
}
