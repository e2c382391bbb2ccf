//! Token-gated object download, mirroring the public download URL shape.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use pixdrop_core::constants::DEFAULT_CONTENT_TYPE;
use pixdrop_core::AppError;
use pixdrop_storage::StorageError;
use serde::Deserialize;

use crate::auth::verifier::secure_compare;
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub alt: Option<String>,
    pub token: Option<String>,
}

/// Serve an object when `token` matches its retrieval token.
///
/// The stored token may hold several comma separated values; any of them
/// grants access.
#[tracing::instrument(skip(state, query), fields(operation = "download_object"))]
pub async fn download_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, object_path)): Path<(String, String)>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, HttpAppError> {
    if bucket != state.storage.bucket() {
        return Err(AppError::NotFound(format!("Unknown bucket {}", bucket)).into());
    }

    if query.alt.as_deref() != Some("media") {
        return Err(AppError::BadRequest("Only alt=media is supported".to_string()).into());
    }

    let object = state.storage.get(&object_path).await.map_err(|e| match e {
        StorageError::NotFound(_) | StorageError::InvalidKey(_) => {
            AppError::NotFound(object_path.clone())
        }
        other => {
            tracing::error!(error = %other, object_path = %object_path, "Failed to read object");
            AppError::Internal(other.to_string())
        }
    })?;

    let presented = query.token.as_deref().unwrap_or_default();
    let granted = !presented.is_empty()
        && object
            .download_token
            .as_deref()
            .map(|stored| stored.split(',').any(|t| secure_compare(presented, t.trim())))
            .unwrap_or(false);

    if !granted {
        return Err(AppError::Forbidden(format!("Invalid download token for {}", object_path)).into());
    }

    let content_type = object
        .content_type
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from(object.bytes))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })
}
