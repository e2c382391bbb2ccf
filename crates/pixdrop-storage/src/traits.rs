//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata attached to every object written by the upload path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAttributes {
    pub content_type: String,
    /// Retrieval token gating the public download URL
    pub download_token: String,
}

/// An object read back from storage.
///
/// Attributes are optional because objects may have been written by other tools.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub download_token: Option<String>,
}

/// Storage abstraction trait
///
/// Backends are created once at startup and shared as `Arc<dyn Storage>`.
/// Keys are bucket-relative object paths (`images/cat.png`); see
/// [`crate::keys::validate_object_path`] for what is accepted.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream the file at `source` into the object at `key`, replacing any
    /// existing object. Returns the number of bytes written.
    ///
    /// A failed or abandoned write must never leave a partial object
    /// addressable under `key`.
    async fn put_file(
        &self,
        key: &str,
        source: &Path,
        attributes: &ObjectAttributes,
    ) -> StorageResult<u64>;

    /// Read an object and its attributes
    async fn get(&self, key: &str) -> StorageResult<StoredObject>;

    /// Delete an object. Deleting an absent object succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Bucket this backend writes into
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
