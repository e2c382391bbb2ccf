//! Bearer token verification seam.

use async_trait::async_trait;
use pixdrop_core::models::VerifiedIdentity;
use pixdrop_core::AppError;
use subtle::ConstantTimeEq;

/// Validates a bearer credential against an identity authority.
///
/// Implementations return `AppError::Unauthorized` for every rejection,
/// including failures to reach the authority.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

pub(crate) fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Fixed tokens from configuration, for local development and tests.
pub struct StaticTokenVerifier {
    tokens: Vec<String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        // Compare against every entry so timing does not reveal which one matched.
        let matched = self
            .tokens
            .iter()
            .enumerate()
            .fold(None, |found, (index, candidate)| {
                if secure_compare(token, candidate) {
                    Some(index)
                } else {
                    found
                }
            });

        match matched {
            Some(index) => Ok(VerifiedIdentity::new(format!("static-token-{}", index))),
            None => Err(AppError::Unauthorized("Unknown static token".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_compare_requires_exact_match() {
        assert!(secure_compare("abc", "abc"));
        assert!(!secure_compare("abc", "abd"));
        assert!(!secure_compare("abc", "abcd"));
    }

    #[tokio::test]
    async fn static_verifier_accepts_configured_tokens() {
        let verifier = StaticTokenVerifier::new(vec!["first".to_string(), "second".to_string()]);

        let identity = verifier.verify("second").await.unwrap();
        assert_eq!(identity.subject, "static-token-1");

        assert!(matches!(
            verifier.verify("third").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn static_verifier_with_no_tokens_rejects_everything() {
        let verifier = StaticTokenVerifier::new(Vec::new());
        assert!(verifier.verify("").await.is_err());
    }
}
