//! Firebase ID token verification
//!
//! RS256 tokens signed by Google's securetoken service, validated against the
//! published JWKS with key rotation handled through a TTL cache keyed by `kid`.

use crate::auth::verifier::TokenVerifier;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use pixdrop_core::constants::FIREBASE_ISSUER_PREFIX;
use pixdrop_core::models::VerifiedIdentity;
use pixdrop_core::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Clock skew tolerated on `exp` and `iat`.
const CLOCK_SKEW_SECS: u64 = 60;
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// JSON Web Key structure (RSA only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(rename = "kty")]
    pub key_type: String,
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
    #[serde(rename = "alg")]
    pub algorithm: Option<String>,
    #[serde(rename = "n")]
    pub modulus: Option<String>,
    #[serde(rename = "e")]
    pub exponent: Option<String>,
}

/// Claims carried by a Firebase ID token
#[derive(Debug, Serialize, Deserialize)]
pub struct FirebaseClaims {
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,
}

/// Cached public key with expiration
#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    expires_at: DateTime<Utc>,
}

pub struct FirebaseTokenVerifier {
    project_id: String,
    jwks_url: String,
    http: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CachedKey>>>,
    cache_ttl_seconds: i64,
}

impl FirebaseTokenVerifier {
    /// # Arguments
    /// * `project_id` - Firebase project; expected audience and issuer suffix
    /// * `jwks_url` - Key set URL (Google's securetoken JWKS in production)
    /// * `cache_ttl_seconds` - How long fetched keys are trusted
    pub fn new(project_id: String, jwks_url: String, cache_ttl_seconds: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            project_id,
            jwks_url,
            http,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl_seconds: i64::try_from(cache_ttl_seconds).unwrap_or(i64::MAX / 2),
        }
    }

    fn issuer(&self) -> String {
        format!("{}{}", FIREBASE_ISSUER_PREFIX, self.project_id)
    }

    /// Fetch JWKS from the configured URL
    async fn fetch_jwks(&self) -> Result<Jwks, AppError> {
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "JWKS endpoint returned error: {}",
                response.status()
            )));
        }

        response
            .json::<Jwks>()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to parse JWKS: {}", e)))
    }

    fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AppError> {
        if jwk.key_type != "RSA" {
            return Err(AppError::Unauthorized(format!(
                "Unsupported key type: {}",
                jwk.key_type
            )));
        }

        let n = jwk
            .modulus
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("RSA key missing modulus".to_string()))?;
        let e = jwk
            .exponent
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("RSA key missing exponent".to_string()))?;

        DecodingKey::from_rsa_components(n, e)
            .map_err(|e| AppError::Unauthorized(format!("Failed to create RSA key: {}", e)))
    }

    /// Get decoding key for a key ID, refreshing the whole key set on a miss
    async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AppError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(kid) {
                if cached.expires_at > Utc::now() {
                    return Ok(cached.key.clone());
                }
            }
        }

        let jwks = self.fetch_jwks().await?;
        let expires_at = Utc::now() + chrono::Duration::seconds(self.cache_ttl_seconds);

        let mut cache = self.cache.write().await;
        cache.retain(|_, cached| cached.expires_at > Utc::now());

        for jwk in &jwks.keys {
            let Some(key_id) = jwk.key_id.as_deref() else {
                continue;
            };
            match Self::jwk_to_decoding_key(jwk) {
                Ok(key) => {
                    cache.insert(key_id.to_string(), CachedKey { key, expires_at });
                }
                Err(e) => {
                    tracing::debug!(kid = %key_id, error = %e, "Skipping unusable JWKS entry");
                }
            }
        }

        tracing::debug!(keys = cache.len(), "JWKS refreshed");

        cache
            .get(kid)
            .map(|cached| cached.key.clone())
            .ok_or_else(|| AppError::Unauthorized(format!("Key ID {} not found in JWKS", kid)))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = vec![Algorithm::RS256];
        validation.leeway = CLOCK_SKEW_SECS;
        validation.validate_exp = true;
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token header: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("Token header has no kid".to_string()))?;

        let decoding_key = self.get_decoding_key(&kid).await?;

        let token_data =
            decode::<FirebaseClaims>(token, &decoding_key, &self.validation()).map_err(|e| {
                tracing::debug!("Firebase token validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::Unauthorized("Token has expired".to_string())
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                        AppError::Unauthorized("Invalid token issuer".to_string())
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidAudience => {
                        AppError::Unauthorized("Invalid token audience".to_string())
                    }
                    _ => AppError::Unauthorized(format!("Invalid token: {}", e)),
                }
            })?;

        let claims = token_data.claims;

        if claims.iat > Utc::now().timestamp() + CLOCK_SKEW_SECS as i64 {
            return Err(AppError::Unauthorized(
                "Token issued in the future".to_string(),
            ));
        }

        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized("Token has empty subject".to_string()));
        }

        Ok(VerifiedIdentity::new(claims.sub))
    }

    fn name(&self) -> &'static str {
        "firebase"
    }
}
