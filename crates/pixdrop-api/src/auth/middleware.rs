//! Ingress gate for the upload endpoint.
//!
//! Runs before any body parsing: the method is checked first, then the
//! presence and shape of the `Authorization` header. The token itself is only
//! extracted here; verification belongs to the upload orchestrator.

use crate::auth::models::BearerToken;
use crate::error::HttpAppError;
use crate::middleware::audit;
use axum::{
    extract::Request,
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use pixdrop_core::AppError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract `<token>` from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing authorization header")?
        .to_str()
        .map_err(|_| "Authorization header is not valid UTF-8")?;

    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() => Ok(token),
        Some(_) => Err("Empty bearer token"),
        None => Err("Invalid authorization header format"),
    }
}

pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

pub(crate) fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

pub async fn ingress_gate(mut request: Request, next: Next) -> Response {
    if request.method() != Method::POST {
        tracing::debug!(method = %request.method(), "Rejected non-POST upload request");
        return HttpAppError(AppError::MethodNotAllowed).into_response();
    }

    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(reason) => {
            audit::log_authentication_attempt(
                None,
                client_ip(request.headers()),
                user_agent(request.headers()),
                false,
                Some(reason.to_string()),
            );
            return HttpAppError(AppError::Unauthorized(reason.to_string())).into_response();
        }
    };

    request.extensions_mut().insert(BearerToken(token));
    next.run(request).await
}
