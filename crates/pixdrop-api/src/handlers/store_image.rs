use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use pixdrop_core::models::StoreImageResponse;

use crate::auth::BearerToken;
use crate::error::{ErrorResponse, HttpAppError, MessageResponse};
use crate::multipart::{collect_upload, MultipartStreamParser};
use crate::state::AppState;

/// Store an uploaded image
///
/// Streams the single file part of a `multipart/form-data` body to scratch
/// storage, verifies the bearer token, then writes the file to the bucket.
/// With an `oldImagePath` field the object at that path is overwritten;
/// otherwise a new `{uuid}-{filename}` object is created.
///
/// # Errors
/// - `AppError::MethodNotAllowed` - Any method other than POST (legacy 500)
/// - `AppError::Unauthorized` - Missing, malformed or rejected bearer token
/// - `AppError::BadRequest` - No file part, or an invalid `oldImagePath`
/// - `AppError::PayloadTooLarge` - File exceeds the configured size limit
/// - `AppError::StorageWriteFailed` - Bucket write failed (401, distinct code)
#[utoipa::path(
    post,
    path = "/storeImage",
    tag = "images",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "One file part plus an optional URI-encoded `oldImagePath` field"),
    responses(
        (status = 201, description = "Image stored", body = StoreImageResponse),
        (status = 400, description = "No file provided or invalid oldImagePath", body = ErrorResponse),
        (status = 401, description = "Unauthorized, or storage write failed (code STORAGE_WRITE_FAILED)", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Method other than POST", body = MessageResponse)
    )
)]
#[tracing::instrument(skip(state, token, multipart), fields(operation = "store_image"))]
pub async fn store_image(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<StoreImageResponse>), HttpAppError> {
    let mut parser = match multipart {
        Ok(multipart) => MultipartStreamParser::new(multipart, state.scratch.clone()),
        Err(rejection) => {
            // Treated as a stream with no parts so the missing file is reported
            // after the token has been verified.
            tracing::debug!(error = %rejection, "Upload body is not multipart");
            MultipartStreamParser::empty(state.scratch.clone())
        }
    };

    let form = collect_upload(&mut parser).await?;
    let response = state.uploads.store(&token.0, form).await?;

    Ok((StatusCode::CREATED, Json(response)))
}
