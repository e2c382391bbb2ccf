//! Error types module
//!
//! All failures of the ingestion and cleanup paths are unified under `AppError`.
//! Each variant self-describes how it is presented over HTTP through the
//! `ErrorMetadata` trait, so handlers never pick status codes by hand.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like a missing bearer header
    Debug,
    /// Warning level - for client mistakes worth noticing
    Warn,
    /// Error level - for backend failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_WRITE_FAILED")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether the machine code is included in the response body
    fn exposes_code(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage write failed: {0}")]
    StorageWriteFailed(String),

    #[error("Storage delete failed: {0}")]
    StorageDeleteFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Short variant name used as a structured log field
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::MethodNotAllowed => "MethodNotAllowed",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::BadRequest(_) => "BadRequest",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::NotFound(_) => "NotFound",
            AppError::Forbidden(_) => "Forbidden",
            AppError::StorageWriteFailed(_) => "StorageWriteFailed",
            AppError::StorageDeleteFailed(_) => "StorageDeleteFailed",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
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

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, exposes_code, log_level).
///
/// `Unauthorized` and `StorageWriteFailed` share the legacy 401 status; only the
/// machine code tells them apart.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::MethodNotAllowed => (500, "METHOD_NOT_ALLOWED", false, LogLevel::Debug),
        AppError::Unauthorized(_) => (401, "UNAUTHORIZED", false, LogLevel::Debug),
        AppError::BadRequest(_) => (400, "BAD_REQUEST", true, LogLevel::Debug),
        AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", true, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", true, LogLevel::Debug),
        AppError::Forbidden(_) => (403, "FORBIDDEN", true, LogLevel::Warn),
        AppError::StorageWriteFailed(_) => (401, "STORAGE_WRITE_FAILED", true, LogLevel::Error),
        AppError::StorageDeleteFailed(_) => (500, "STORAGE_DELETE_FAILED", true, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MethodNotAllowed => "Not allowed.".to_string(),
            AppError::Unauthorized(_) | AppError::StorageWriteFailed(_) => {
                "Unauthorized.".to_string()
            }
            AppError::BadRequest(msg) => msg.clone(),
            AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::NotFound(_) => "Not found.".to_string(),
            AppError::Forbidden(_) => "Forbidden.".to_string(),
            AppError::StorageDeleteFailed(_) => "Cleanup failed.".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error.".to_string()
            }
        }
    }

    fn exposes_code(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }
}
