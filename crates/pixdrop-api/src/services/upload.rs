//! Upload orchestration: verify, place, write, respond.

use crate::auth::TokenVerifier;
use crate::middleware::audit;
use crate::multipart::UploadForm;
use crate::utils::upload::sanitize_filename;
use pixdrop_core::models::{StorageObjectDescriptor, StoreImageResponse};
use pixdrop_core::AppError;
use pixdrop_storage::keys::{generate_object_path, validate_object_path};
use pixdrop_storage::{download_url, ObjectAttributes, Storage};
use std::sync::Arc;
use uuid::Uuid;

/// Sequences token verification and the storage write for one upload.
///
/// Steps run strictly in order and each one gates the next; in particular no
/// byte reaches storage before the token has been verified.
#[derive(Clone)]
pub struct UploadOrchestrator {
    storage: Arc<dyn Storage>,
    verifier: Arc<dyn TokenVerifier>,
    download_url_host: String,
}

impl UploadOrchestrator {
    pub fn new(
        storage: Arc<dyn Storage>,
        verifier: Arc<dyn TokenVerifier>,
        download_url_host: String,
    ) -> Self {
        Self {
            storage,
            verifier,
            download_url_host,
        }
    }

    /// Object path for this upload: the replace target when given, otherwise
    /// `{uuid}-{sanitized filename}`.
    fn object_path(old_image_path: Option<String>, original_filename: &str) -> Result<String, AppError> {
        match old_image_path {
            Some(path) => {
                validate_object_path(&path)
                    .map_err(|e| AppError::BadRequest(format!("Invalid oldImagePath: {}", e)))?;
                Ok(path)
            }
            None => Ok(generate_object_path(
                &Uuid::new_v4().to_string(),
                &sanitize_filename(original_filename),
            )),
        }
    }

    #[tracing::instrument(
        skip(self, token, form),
        fields(verifier = self.verifier.name(), replace = form.old_image_path.is_some())
    )]
    pub async fn store(&self, token: &str, form: UploadForm) -> Result<StoreImageResponse, AppError> {
        // `form` owns the staged file; returning early drops it and deletes the scratch copy.
        let identity = match self.verifier.verify(token).await {
            Ok(identity) => identity,
            Err(e) => {
                audit::log_authentication_attempt(None, None, None, false, Some(e.to_string()));
                return Err(e);
            }
        };
        audit::log_authentication_attempt(
            Some(identity.subject.clone()),
            None,
            None,
            true,
            None,
        );

        let UploadForm {
            file,
            old_image_path,
        } = form;
        let staged = file.ok_or_else(|| AppError::BadRequest("No file provided.".to_string()))?;

        let replaced = old_image_path.is_some();
        let descriptor = StorageObjectDescriptor {
            object_path: Self::object_path(old_image_path, staged.original_filename())?,
            content_type: staged.content_type().to_string(),
            retrieval_token: Uuid::new_v4().to_string(),
        };

        let attributes = ObjectAttributes {
            content_type: descriptor.content_type.clone(),
            download_token: descriptor.retrieval_token.clone(),
        };

        let write = self
            .storage
            .put_file(&descriptor.object_path, staged.path(), &attributes)
            .await;

        let staged_size = staged.size();
        if let Err(e) = staged.release() {
            tracing::warn!(error = %e, "Failed to release staged upload");
        }

        let size_bytes = write.map_err(|e| {
            tracing::error!(
                error = %e,
                object_path = %descriptor.object_path,
                size_bytes = staged_size,
                "Storage write failed"
            );
            AppError::StorageWriteFailed(e.to_string())
        })?;

        let response = StoreImageResponse {
            image_url: download_url(
                &self.download_url_host,
                self.storage.bucket(),
                &descriptor.object_path,
                &descriptor.retrieval_token,
            ),
            image_path: descriptor.object_path.clone(),
        };

        audit::log_file_uploaded(&identity.subject, &descriptor.object_path, size_bytes, replaced);

        tracing::info!(
            object_path = %descriptor.object_path,
            content_type = %descriptor.content_type,
            size_bytes,
            replaced,
            "Image stored"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_target_is_used_verbatim() {
        let path =
            UploadOrchestrator::object_path(Some("images/old.png".to_string()), "dog.png").unwrap();
        assert_eq!(path, "images/old.png");
    }

    #[test]
    fn invalid_replace_target_is_a_bad_request() {
        let result = UploadOrchestrator::object_path(Some("../x.png".to_string()), "dog.png");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn generated_path_is_uuid_prefixed_sanitized_name() {
        let path = UploadOrchestrator::object_path(None, "my cat.png").unwrap();
        let (prefix, rest) = path.split_at(36);
        assert!(Uuid::parse_str(prefix).is_ok());
        assert_eq!(rest, "-my_cat.png");
    }
}
