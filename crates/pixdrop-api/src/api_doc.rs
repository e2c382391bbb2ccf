//! OpenAPI documentation.

use axum::Json;
use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use pixdrop_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pixdrop API",
        version = "0.1.0",
        description = "Authenticated image ingestion into object storage, with cleanup of objects whose owning record was deleted. Uploads require `Authorization: Bearer <Firebase ID token>`."
    ),
    paths(
        handlers::store_image::store_image,
        handlers::record_deleted::record_deleted,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::StoreImageResponse,
            handlers::health::HealthResponse,
            error::ErrorResponse,
            error::MessageResponse,
        )
    ),
    tags(
        (name = "images", description = "Image upload"),
        (name = "events", description = "Notifications from the metadata store"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Serve the generated OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
