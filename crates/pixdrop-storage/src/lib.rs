//! Pixdrop Storage Library
//!
//! Storage abstraction and the backends the upload service writes through:
//! `object_store` clients (Cloud Storage, S3, in-memory) and the local filesystem.
//!
//! # Object paths
//!
//! Objects are addressed by bucket-relative paths. Generated paths are
//! `{uuid}-{sanitized filename}`; replace and cleanup targets are caller
//! supplied. All backends reject paths that are absolute or contain `..`
//! (see [`keys::validate_object_path`]).

pub mod download_url;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-remote")]
pub mod remote;
pub mod traits;

// Re-export commonly used types
pub use download_url::download_url;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use pixdrop_core::StorageBackend;
#[cfg(feature = "storage-remote")]
pub use remote::RemoteStorage;
pub use traits::{ObjectAttributes, Storage, StorageError, StorageResult, StoredObject};
