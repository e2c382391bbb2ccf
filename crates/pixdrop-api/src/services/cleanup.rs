//! Orphan cleanup driven by record-deleted notifications.

use crate::middleware::audit;
use pixdrop_core::models::RecordDeletedEvent;
use pixdrop_core::AppError;
use pixdrop_storage::keys::validate_object_path;
use pixdrop_storage::Storage;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The referenced object is gone (deleted now, or already absent)
    Deleted { object_path: String },
    /// The record carried no `imagePath`
    NothingToClean,
}

/// Removes the stored object referenced by a deleted record.
///
/// Failures are returned to the caller so the notifier sees them; there is no
/// local retry.
#[derive(Clone)]
pub struct CleanupListener {
    storage: Arc<dyn Storage>,
}

impl CleanupListener {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    #[tracing::instrument(skip(self, event), fields(record_id = ?event.record_id))]
    pub async fn on_record_deleted(
        &self,
        event: &RecordDeletedEvent,
    ) -> Result<CleanupOutcome, AppError> {
        let Some(object_path) = event.data.object_path() else {
            tracing::debug!("Deleted record has no imagePath, nothing to clean");
            return Ok(CleanupOutcome::NothingToClean);
        };

        validate_object_path(object_path)
            .map_err(|e| AppError::BadRequest(format!("Invalid imagePath: {}", e)))?;

        if let Err(e) = self.storage.delete(object_path).await {
            audit::log_file_deleted(object_path, event.record_id.as_deref(), Some(e.to_string()));
            return Err(AppError::StorageDeleteFailed(e.to_string()));
        }

        audit::log_file_deleted(object_path, event.record_id.as_deref(), None);

        Ok(CleanupOutcome::Deleted {
            object_path: object_path.to_string(),
        })
    }
}
