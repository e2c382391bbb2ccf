//! Route configuration and setup

use crate::api_doc::openapi_json;
use crate::auth::middleware::ingress_gate;
use crate::handlers;
use crate::middleware::request_id_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{any, get, post},
    Router,
};
use pixdrop_core::constants::{RECORD_DELETED_PATH, STORE_IMAGE_PATH};
use pixdrop_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Headroom over the file cap for multipart boundaries and text fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(&state.config)?;

    let body_limit = state
        .config
        .upload
        .max_file_size_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    // The gate answers every method on the ingress path so the legacy
    // "Not allowed." body is kept for non-POST requests.
    let ingress_routes = Router::new()
        .route(STORE_IMAGE_PATH, any(handlers::store_image::store_image))
        .route_layer(from_fn(ingress_gate));

    let public_routes = Router::new()
        .route(
            RECORD_DELETED_PATH,
            post(handlers::record_deleted::record_deleted),
        )
        .route(
            "/v0/b/{bucket}/o/{object}",
            get(handlers::download::download_object),
        )
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json));

    let app = ingress_routes
        .merge(public_routes)
        // Size is enforced while streaming to scratch; the extractor default would cut at 2MB.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
