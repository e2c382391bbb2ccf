//! Storage wrapper that counts writes and can be told to fail them.

use async_trait::async_trait;
use pixdrop_storage::{
    ObjectAttributes, Storage, StorageBackend, StorageError, StorageResult, StoredObject,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct CountingStorage {
    inner: Arc<dyn Storage>,
    fail_writes: bool,
    puts: AtomicUsize,
    deletes: AtomicUsize,
}

impl CountingStorage {
    pub fn new(inner: Arc<dyn Storage>, fail_writes: bool) -> Self {
        Self {
            inner,
            fail_writes,
            puts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn put_file(
        &self,
        key: &str,
        source: &Path,
        attributes: &ObjectAttributes,
    ) -> StorageResult<u64> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(StorageError::UploadFailed("bucket is read-only".to_string()));
        }
        self.inner.put_file(key, source, attributes).await
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
