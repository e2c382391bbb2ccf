use crate::keys::validate_object_path;
use crate::traits::{ObjectAttributes, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

const OBJECTS_DIR: &str = "objects";
const METADATA_DIR: &str = "metadata";
const METADATA_SUFFIX: &str = ".json";
const TEMP_PREFIX: &str = ".pixdrop-";

/// Local filesystem storage implementation
///
/// Layout under `base_path`:
/// - `objects/<object path>`: object bytes
/// - `metadata/<object path>.json`: [`ObjectAttributes`]
///
/// Writes land in a temp file next to the target and are renamed into place,
/// so readers never observe a partially written object. The two renames of a
/// write and the two reads of a `get` share `commit_lock`, so an object is
/// always paired with the attributes written alongside it.
#[derive(Clone)]
pub struct LocalStorage {
    objects_path: PathBuf,
    metadata_path: PathBuf,
    bucket: String,
    commit_lock: Arc<RwLock<()>>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "./data/storage")
    /// * `bucket` - Bucket name reported in download URLs
    pub async fn new(base_path: impl Into<PathBuf>, bucket: impl Into<String>) -> StorageResult<Self> {
        let base_path = base_path.into();
        let objects_path = base_path.join(OBJECTS_DIR);
        let metadata_path = base_path.join(METADATA_DIR);

        for dir in [&objects_path, &metadata_path] {
            fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(LocalStorage {
            objects_path,
            metadata_path,
            bucket: bucket.into(),
            commit_lock: Arc::new(RwLock::new(())),
        })
    }

    fn object_file(&self, key: &str) -> StorageResult<PathBuf> {
        validate_object_path(key)?;
        Ok(self.objects_path.join(key))
    }

    fn metadata_file(&self, key: &str) -> StorageResult<PathBuf> {
        validate_object_path(key)?;
        Ok(self
            .metadata_path
            .join(format!("{}{}", key, METADATA_SUFFIX)))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(path: &Path) -> StorageResult<PathBuf> {
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| StorageError::InvalidKey(format!("No parent for {}", path.display())))?;
        fs::create_dir_all(&parent).await?;
        Ok(parent)
    }

    /// Create a temp file in `dir`; it is removed on drop unless persisted.
    fn temp_file_in(dir: &Path) -> StorageResult<(fs::File, tempfile::TempPath)> {
        let named = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create temp file in {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        let (file, temp_path) = named.into_parts();
        Ok((fs::File::from_std(file), temp_path))
    }

    async fn read_metadata(&self, key: &str) -> StorageResult<Option<ObjectAttributes>> {
        let path = self.metadata_file(key)?;
        match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|e| StorageError::BackendError(format!("Corrupt metadata for {}: {}", key, e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_if_present(path: &Path) -> std::io::Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_file(
        &self,
        key: &str,
        source: &Path,
        attributes: &ObjectAttributes,
    ) -> StorageResult<u64> {
        let path = self.object_file(key)?;
        let meta_path = self.metadata_file(key)?;
        let start = std::time::Instant::now();

        let object_dir = Self::ensure_parent_dir(&path).await?;
        let meta_dir = Self::ensure_parent_dir(&meta_path).await?;

        let mut source_file = fs::File::open(source).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to open staged file {}: {}",
                source.display(),
                e
            ))
        })?;

        let (mut object_tmp, object_tmp_path) = Self::temp_file_in(&object_dir)?;
        let size = tokio::io::copy(&mut source_file, &mut object_tmp)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!("Failed to write {}: {}", path.display(), e))
            })?;
        object_tmp.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync {}: {}", path.display(), e))
        })?;
        drop(object_tmp);

        let meta_bytes = serde_json::to_vec(attributes)
            .map_err(|e| StorageError::UploadFailed(format!("Failed to encode metadata: {}", e)))?;
        let (mut meta_tmp, meta_tmp_path) = Self::temp_file_in(&meta_dir)?;
        meta_tmp.write_all(&meta_bytes).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write metadata for {}: {}", key, e))
        })?;
        meta_tmp.sync_all().await?;
        drop(meta_tmp);

        let commit = self.commit_lock.write().await;
        // Metadata first: a visible object always has its token.
        meta_tmp_path.persist(&meta_path).map_err(|e| {
            StorageError::UploadFailed(format!("Failed to commit metadata for {}: {}", key, e))
        })?;
        object_tmp_path.persist(&path).map_err(|e| {
            StorageError::UploadFailed(format!("Failed to commit {}: {}", path.display(), e))
        })?;
        drop(commit);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(size)
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        let path = self.object_file(key)?;
        let _commit = self.commit_lock.read().await;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => {
                return Err(StorageError::DownloadFailed(format!(
                    "Failed to read file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let metadata = self.read_metadata(key).await?;

        Ok(StoredObject {
            bytes: Bytes::from(data),
            content_type: metadata.as_ref().map(|m| m.content_type.clone()),
            download_token: metadata.map(|m| m.download_token),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.object_file(key)?;
        let meta_path = self.metadata_file(key)?;
        let _commit = self.commit_lock.write().await;

        let removed = Self::remove_if_present(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete {}: {}", path.display(), e))
        })?;
        Self::remove_if_present(&meta_path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete metadata for {}: {}", key, e))
        })?;

        if removed {
            tracing::info!(path = %path.display(), key = %key, "Local storage delete successful");
        } else {
            tracing::debug!(key = %key, "Local object already absent");
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.object_file(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
