pub mod firebase;
pub mod middleware;
pub mod models;
pub mod verifier;

pub use firebase::FirebaseTokenVerifier;
pub use models::BearerToken;
pub use verifier::{StaticTokenVerifier, TokenVerifier};
