//! Pixdrop Core Library
//!
//! Domain models, error types and configuration shared by the storage and API
//! crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{AuthMode, Config};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
