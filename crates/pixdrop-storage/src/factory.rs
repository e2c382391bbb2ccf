#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-remote")]
use crate::RemoteStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use pixdrop_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage_config = &config.storage;
    let bucket = storage_config
        .bucket_name()
        .map(String::from)
        .ok_or_else(|| StorageError::ConfigError("STORAGE_BUCKET not configured".to_string()))?;

    match storage_config.backend {
        #[cfg(feature = "storage-remote")]
        StorageBackend::Gcs => {
            let storage =
                RemoteStorage::gcs(bucket, storage_config.gcs_service_account_path.clone())?;
            Ok(Arc::new(storage))
        }

        #[cfg(feature = "storage-remote")]
        StorageBackend::S3 => {
            let region = storage_config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let storage = RemoteStorage::s3(bucket, region, storage_config.s3_endpoint.clone())?;
            Ok(Arc::new(storage))
        }

        #[cfg(feature = "storage-remote")]
        StorageBackend::Memory => Ok(Arc::new(RemoteStorage::in_memory(bucket))),

        #[cfg(not(feature = "storage-remote"))]
        StorageBackend::Gcs | StorageBackend::S3 | StorageBackend::Memory => {
            Err(StorageError::ConfigError(format!(
                "{} storage backend not available (storage-remote feature not enabled)",
                storage_config.backend
            )))
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage =
                LocalStorage::new(storage_config.local_storage_path.clone(), bucket).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "storage-local")]
    #[tokio::test]
    async fn creates_local_backend_with_fallback_bucket() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.local_storage_path = dir.path().to_path_buf();

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        assert_eq!(storage.bucket(), "local-bucket");
    }

    #[cfg(feature = "storage-remote")]
    #[tokio::test]
    async fn creates_memory_backend() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        config.storage.bucket = Some("test-bucket".to_string());

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Memory);
        assert_eq!(storage.bucket(), "test-bucket");
    }

    #[tokio::test]
    async fn remote_backend_without_bucket_is_a_config_error() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Gcs;

        assert!(matches!(
            create_storage(&config).await,
            Err(StorageError::ConfigError(_))
        ));
    }
}
