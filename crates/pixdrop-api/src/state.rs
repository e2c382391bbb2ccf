//! Application state shared by all handlers.

use crate::auth::TokenVerifier;
use crate::multipart::ScratchConfig;
use crate::services::{CleanupListener, UploadOrchestrator};
use pixdrop_core::Config;
use pixdrop_storage::Storage;
use std::sync::Arc;

/// Long-lived collaborators, built once at startup and reused across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<dyn Storage>,
    pub uploads: UploadOrchestrator,
    pub cleanup: CleanupListener,
    pub scratch: ScratchConfig,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        let uploads = UploadOrchestrator::new(
            storage.clone(),
            verifier,
            config.storage.download_url_host.clone(),
        );
        let cleanup = CleanupListener::new(storage.clone());
        let scratch = ScratchConfig {
            dir: config.upload.scratch_dir.clone(),
            max_file_size_bytes: config.upload.max_file_size_bytes,
        };

        Self {
            config: Arc::new(config),
            storage,
            uploads,
            cleanup,
            scratch,
        }
    }
}
