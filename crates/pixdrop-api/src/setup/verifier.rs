//! Token verifier selection

use crate::auth::{FirebaseTokenVerifier, StaticTokenVerifier, TokenVerifier};
use anyhow::Result;
use pixdrop_core::{AuthMode, Config};
use std::sync::Arc;

pub fn setup_verifier(config: &Config) -> Result<Arc<dyn TokenVerifier>> {
    let auth = &config.auth;

    let verifier: Arc<dyn TokenVerifier> = match auth.mode {
        AuthMode::Firebase => {
            let project_id = auth.firebase_project_id.clone().ok_or_else(|| {
                anyhow::anyhow!("FIREBASE_PROJECT_ID is required when AUTH_MODE=firebase")
            })?;
            tracing::info!(project_id = %project_id, jwks_url = %auth.jwks_url, "Using Firebase token verification");
            Arc::new(FirebaseTokenVerifier::new(
                project_id,
                auth.jwks_url.clone(),
                auth.jwks_cache_ttl_secs,
            ))
        }
        AuthMode::Static => {
            tracing::warn!(
                tokens = auth.static_tokens.len(),
                "Using static bearer tokens - intended for local development only"
            );
            Arc::new(StaticTokenVerifier::new(auth.static_tokens.clone()))
        }
    };

    Ok(verifier)
}
