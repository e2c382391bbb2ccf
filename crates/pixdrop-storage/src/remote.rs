use crate::keys::validate_object_path;
use crate::traits::{ObjectAttributes, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, GetOptions, ObjectStore, ObjectStoreExt, PutMultipartOptions,
    PutOptions, PutPayload, WriteMultipart,
};
use pixdrop_core::constants::DOWNLOAD_TOKEN_METADATA_KEY;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Files at or below this size are written with a single put.
pub const MULTIPART_THRESHOLD_BYTES: u64 = 8 * 1024 * 1024;

const READ_CHUNK_BYTES: usize = 1024 * 1024;
const MAX_IN_FLIGHT_PARTS: usize = 4;

/// Object storage backed by an `object_store` client (Cloud Storage, S3 or in-memory)
#[derive(Clone)]
pub struct RemoteStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    backend: StorageBackend,
}

impl RemoteStorage {
    /// Wrap an already configured object store
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String, backend: StorageBackend) -> Self {
        Self {
            store,
            bucket,
            backend,
        }
    }

    /// Cloud Storage bucket, credentials resolved from the environment unless
    /// a service account file is given.
    pub fn gcs(bucket: String, service_account_path: Option<String>) -> StorageResult<Self> {
        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket.clone());

        if let Some(path) = service_account_path {
            builder = builder.with_service_account_path(path);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(Arc::new(store), bucket, StorageBackend::Gcs))
    }

    /// S3 or an S3-compatible provider when `endpoint_url` is set
    /// (e.g. "http://localhost:9000" for MinIO)
    pub fn s3(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(Arc::new(store), bucket, StorageBackend::S3))
    }

    /// Process-local store, contents vanish on shutdown
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::new(
            Arc::new(InMemory::new()),
            bucket.into(),
            StorageBackend::Memory,
        )
    }

    fn location(key: &str) -> StorageResult<ObjectPath> {
        validate_object_path(key)?;
        Ok(ObjectPath::from(key))
    }

    fn build_attributes(attributes: &ObjectAttributes) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(
            Attribute::ContentType,
            attributes.content_type.clone().into(),
        );
        attrs.insert(
            Attribute::Metadata(DOWNLOAD_TOKEN_METADATA_KEY.into()),
            attributes.download_token.clone().into(),
        );
        attrs
    }

    fn attribute_string(attributes: &Attributes, key: &Attribute) -> Option<String> {
        attributes.get(key).map(|value| {
            let value: &str = value.as_ref();
            value.to_string()
        })
    }

    async fn put_single(
        &self,
        location: &ObjectPath,
        file: &mut tokio::fs::File,
        size: u64,
        attributes: Attributes,
    ) -> StorageResult<()> {
        let mut buffer = Vec::with_capacity(size as usize);
        file.read_to_end(&mut buffer).await?;

        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(location, PutPayload::from(Bytes::from(buffer)), opts)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(())
    }

    /// Stream the file in parts. The upload is aborted on any failure so no
    /// object is ever committed from a partial body.
    async fn put_multipart(
        &self,
        location: &ObjectPath,
        file: &mut tokio::fs::File,
        attributes: Attributes,
    ) -> StorageResult<()> {
        let opts = PutMultipartOptions {
            attributes,
            ..Default::default()
        };

        let upload = self
            .store
            .put_multipart_opts(location, opts)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let mut writer = WriteMultipart::new(upload);
        let mut chunk = vec![0u8; READ_CHUNK_BYTES];

        loop {
            let read = match file.read(&mut chunk).await {
                Ok(read) => read,
                Err(e) => {
                    if let Err(abort_err) = writer.abort().await {
                        tracing::warn!(error = %abort_err, "Failed to abort multipart upload");
                    }
                    return Err(StorageError::UploadFailed(format!(
                        "Failed to read staged file: {}",
                        e
                    )));
                }
            };

            if read == 0 {
                break;
            }

            if let Err(e) = writer.wait_for_capacity(MAX_IN_FLIGHT_PARTS).await {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(error = %abort_err, "Failed to abort multipart upload");
                }
                return Err(StorageError::UploadFailed(e.to_string()));
            }

            writer.write(&chunk[..read]);
        }

        writer
            .finish()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl Storage for RemoteStorage {
    async fn put_file(
        &self,
        key: &str,
        source: &Path,
        attributes: &ObjectAttributes,
    ) -> StorageResult<u64> {
        let location = Self::location(key)?;
        let start = std::time::Instant::now();

        let mut file = tokio::fs::File::open(source).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to open staged file {}: {}",
                source.display(),
                e
            ))
        })?;
        let size = file.metadata().await?.len();
        let attrs = Self::build_attributes(attributes);

        let result = if size <= MULTIPART_THRESHOLD_BYTES {
            self.put_single(&location, &mut file, size, attrs).await
        } else {
            self.put_multipart(&location, &mut file, attrs).await
        };

        if let Err(e) = result {
            tracing::error!(
                error = %e,
                backend = %self.backend,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            return Err(e);
        }

        tracing::info!(
            backend = %self.backend,
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            content_type = %attributes.content_type,
            multipart = size > MULTIPART_THRESHOLD_BYTES,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(size)
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        let location = Self::location(key)?;

        let result = self
            .store
            .get_opts(&location, GetOptions::default())
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
                other => StorageError::DownloadFailed(other.to_string()),
            })?;

        let attributes = result.attributes.clone();
        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(StoredObject {
            bytes,
            content_type: Self::attribute_string(&attributes, &Attribute::ContentType),
            download_token: Self::attribute_string(
                &attributes,
                &Attribute::Metadata(DOWNLOAD_TOKEN_METADATA_KEY.into()),
            ),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let location = Self::location(key)?;
        let start = std::time::Instant::now();

        match self.store.delete(&location).await {
            Ok(()) => {}
            Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(bucket = %self.bucket, key = %key, "Object already absent");
                return Ok(());
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let location = Self::location(key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn staged(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn attrs(token: &str) -> ObjectAttributes {
        ObjectAttributes {
            content_type: "image/png".to_string(),
            download_token: token.to_string(),
        }
    }

    #[tokio::test]
    async fn put_then_get_keeps_attributes() {
        let storage = RemoteStorage::in_memory("bucket");
        let file = staged(b"png-bytes");

        let size = storage
            .put_file("images/cat.png", file.path(), &attrs("tok-1"))
            .await
            .unwrap();
        assert_eq!(size, 9);

        let object = storage.get("images/cat.png").await.unwrap();
        assert_eq!(&object.bytes[..], b"png-bytes");
        assert_eq!(object.content_type.as_deref(), Some("image/png"));
        assert_eq!(object.download_token.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn put_replaces_existing_object() {
        let storage = RemoteStorage::in_memory("bucket");
        storage
            .put_file("a.png", staged(b"first").path(), &attrs("t1"))
            .await
            .unwrap();
        storage
            .put_file("a.png", staged(b"second").path(), &attrs("t2"))
            .await
            .unwrap();

        let object = storage.get("a.png").await.unwrap();
        assert_eq!(&object.bytes[..], b"second");
        assert_eq!(object.download_token.as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn large_files_use_multipart() {
        let storage = RemoteStorage::in_memory("bucket");
        let body = vec![7u8; (MULTIPART_THRESHOLD_BYTES + 1024) as usize];
        let file = staged(&body);

        let size = storage
            .put_file("big.bin", file.path(), &attrs("tok"))
            .await
            .unwrap();
        assert_eq!(size, body.len() as u64);

        let object = storage.get("big.bin").await.unwrap();
        assert_eq!(object.bytes.len(), body.len());
        assert_eq!(object.download_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let storage = RemoteStorage::in_memory("bucket");
        storage
            .put_file("x.png", staged(b"x").path(), &attrs("t"))
            .await
            .unwrap();

        storage.delete("x.png").await.unwrap();
        assert!(!storage.exists("x.png").await.unwrap());
        storage.delete("x.png").await.unwrap();
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let storage = RemoteStorage::in_memory("bucket");
        assert!(matches!(
            storage.get("nope.png").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_keys_are_rejected() {
        let storage = RemoteStorage::in_memory("bucket");
        let result = storage
            .put_file("../escape.png", staged(b"x").path(), &attrs("t"))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
