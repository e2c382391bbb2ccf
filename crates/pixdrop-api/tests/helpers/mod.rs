//! Test helpers: build AppState and router for integration tests.
//!
//! Everything runs against an in-memory bucket, so no credentials or network
//! are needed: `cargo test -p pixdrop-api`.

#![allow(dead_code)]

pub mod storage;
pub mod verifier;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use pixdrop_api::setup::routes;
use pixdrop_api::state::AppState;
use pixdrop_core::Config;
use pixdrop_storage::{RemoteStorage, Storage};
use std::sync::Arc;
use tempfile::TempDir;

pub use storage::CountingStorage;
pub use verifier::StubVerifier;

pub const TEST_BUCKET: &str = "test-bucket";
pub const TEST_TOKEN: &str = "valid-test-token";
pub const DOWNLOAD_HOST: &str = "http://localhost/v0/b";

/// Knobs for a test app
#[derive(Clone)]
pub struct TestOptions {
    pub accept_tokens: bool,
    pub fail_writes: bool,
    pub max_file_size_bytes: u64,
    pub events_shared_secret: Option<String>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            accept_tokens: true,
            fail_writes: false,
            max_file_size_bytes: 10 * 1024 * 1024,
            events_shared_secret: None,
        }
    }
}

/// Test application: server plus handles on the collaborators it was built with.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<CountingStorage>,
    pub verifier: Arc<StubVerifier>,
    pub _scratch: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Files left in the scratch directory
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self._scratch.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let scratch = tempfile::tempdir().expect("Failed to create scratch directory");

    let mut config = Config::default();
    config.storage.bucket = Some(TEST_BUCKET.to_string());
    config.storage.download_url_host = DOWNLOAD_HOST.to_string();
    config.upload.scratch_dir = scratch.path().to_path_buf();
    config.upload.max_file_size_bytes = options.max_file_size_bytes;
    config.events_shared_secret = options.events_shared_secret.clone();

    let inner: Arc<dyn Storage> = Arc::new(RemoteStorage::in_memory(TEST_BUCKET));
    let storage = Arc::new(CountingStorage::new(inner, options.fail_writes));
    let verifier = Arc::new(StubVerifier::new(options.accept_tokens));

    let state = Arc::new(AppState::new(config, storage.clone(), verifier.clone()));
    let app = routes::setup_routes(state).expect("Failed to build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        storage,
        verifier,
        _scratch: scratch,
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn image_form(file_name: &str, bytes: &[u8]) -> MultipartForm {
    let part = Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_type("image/png");
    MultipartForm::new().add_part("file", part)
}

/// Strip the configured host so the download URL can be replayed against the test server.
pub fn local_download_path(image_url: &str) -> String {
    image_url
        .strip_prefix("http://localhost")
        .unwrap_or(image_url)
        .to_string()
}

/// Minimal valid 1x1 PNG bytes.
pub fn minimal_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
        0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0x89, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}
