use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_KEY: &str = "health-check-non-existent-key";

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub storage: String,
}

/// Liveness plus a lightweight storage connectivity probe.
///
/// Storage problems are reported but never fail the check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let storage = match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, state.storage.exists(PROBE_KEY)).await
    {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Storage health check warning");
            format!("degraded: {}", e)
        }
        Err(_) => {
            tracing::warn!("Storage health check timed out");
            "timeout".to_string()
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        backend: state.storage.backend_type().to_string(),
        storage,
    })
}
