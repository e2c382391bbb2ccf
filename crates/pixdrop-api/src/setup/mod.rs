//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod storage;
pub mod verifier;

use crate::state::AppState;
use anyhow::{Context, Result};
use pixdrop_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(&config.log_format)?;

    config
        .validate()
        .context("Configuration validation failed")?;

    tracing::info!(
        environment = %config.environment,
        backend = %config.storage.backend,
        "Configuration loaded and validated successfully"
    );

    let storage = storage::setup_storage(&config).await?;
    let verifier = verifier::setup_verifier(&config)?;

    let state = Arc::new(AppState::new(config, storage, verifier));
    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
