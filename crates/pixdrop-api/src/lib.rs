//! Pixdrop API
//!
//! Authenticated image ingress, token-gated retrieval and orphan cleanup over
//! a pluggable object store.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub(crate) mod utils;

pub use error::{ErrorResponse, HttpAppError, MessageResponse};
pub use state::AppState;
