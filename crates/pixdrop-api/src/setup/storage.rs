//! Storage initialization

use anyhow::{Context, Result};
use pixdrop_core::Config;
use pixdrop_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tokio::fs::create_dir_all(&config.upload.scratch_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload scratch directory {}",
                config.upload.scratch_dir.display()
            )
        })?;

    tracing::info!(
        backend = %storage.backend_type(),
        bucket = %storage.bucket(),
        scratch_dir = %config.upload.scratch_dir.display(),
        "Storage initialized"
    );

    Ok(storage)
}
