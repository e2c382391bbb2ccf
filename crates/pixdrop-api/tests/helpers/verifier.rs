//! Token verifier stub with a call counter.

use async_trait::async_trait;
use pixdrop_api::auth::TokenVerifier;
use pixdrop_core::models::VerifiedIdentity;
use pixdrop_core::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::TEST_TOKEN;

pub struct StubVerifier {
    accept: bool,
    calls: AtomicUsize,
}

impl StubVerifier {
    pub fn new(accept: bool) -> Self {
        Self {
            accept,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenVerifier for StubVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.accept && token == TEST_TOKEN {
            Ok(VerifiedIdentity::new("user-123"))
        } else {
            Err(AppError::Unauthorized("token rejected".to_string()))
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
