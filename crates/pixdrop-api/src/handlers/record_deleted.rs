use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use pixdrop_core::models::RecordDeletedEvent;
use pixdrop_core::AppError;

use crate::auth::middleware::bearer_token;
use crate::auth::verifier::secure_compare;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::CleanupOutcome;
use crate::state::AppState;

/// Record-deleted notification
///
/// Deletes the stored object referenced by the record's `imagePath`.
/// Records without one, and objects that are already gone, are no-ops.
#[utoipa::path(
    post,
    path = "/events/recordDeleted",
    tag = "events",
    request_body(content = inline(Object), content_type = "application/json",
        description = "`{\"recordId\": \"...\", \"data\": {\"imagePath\": \"...\", ...}}`"),
    responses(
        (status = 204, description = "Object deleted, or nothing to clean"),
        (status = 400, description = "Malformed notification", body = ErrorResponse),
        (status = 401, description = "Missing or wrong shared secret", body = ErrorResponse),
        (status = 500, description = "Storage delete failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, payload), fields(operation = "record_deleted"))]
pub async fn record_deleted(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RecordDeletedEvent>, JsonRejection>,
) -> Result<StatusCode, HttpAppError> {
    if let Some(secret) = state.config.events_shared_secret.as_deref() {
        let authorized = bearer_token(&headers)
            .map(|token| secure_compare(token, secret))
            .unwrap_or(false);
        if !authorized {
            return Err(AppError::Unauthorized("Invalid event secret".to_string()).into());
        }
    }

    let Json(event) = payload.map_err(|rejection| {
        AppError::BadRequest(format!("Invalid notification body: {}", rejection.body_text()))
    })?;

    match state.cleanup.on_record_deleted(&event).await? {
        CleanupOutcome::Deleted { object_path } => {
            tracing::info!(object_path = %object_path, "Orphaned object removed");
        }
        CleanupOutcome::NothingToClean => {}
    }

    Ok(StatusCode::NO_CONTENT)
}
