//! Object path rules shared by all backends.
//!
//! Generated paths have the form `{unique_id}-{filename}`; caller supplied
//! paths (replace targets, cleanup targets) are accepted verbatim as long as
//! they pass [`validate_object_path`].

use crate::traits::{StorageError, StorageResult};

/// Longest object name accepted by Cloud Storage, in bytes.
pub const MAX_OBJECT_PATH_LENGTH: usize = 1024;

/// Build the object path for a new upload.
pub fn generate_object_path(unique_id: &str, filename: &str) -> String {
    format!("{}-{}", unique_id, filename)
}

/// Reject paths that are empty, absolute, contain `..` or empty segments,
/// control characters, or exceed the backend length limit.
pub fn validate_object_path(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Object path is empty".to_string()));
    }

    if key.len() > MAX_OBJECT_PATH_LENGTH {
        return Err(StorageError::InvalidKey(format!(
            "Object path exceeds {} bytes",
            MAX_OBJECT_PATH_LENGTH
        )));
    }

    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Object path must be relative and use '/' separators".to_string(),
        ));
    }

    if key.chars().any(|c| c.is_control()) {
        return Err(StorageError::InvalidKey(
            "Object path contains control characters".to_string(),
        ));
    }

    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(
            "Object path contains invalid segments".to_string(),
        ));
    }

    Ok(())
}
