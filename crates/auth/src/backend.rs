//! Token verification backend
//!
//! `TokenVerifier` is the capability consumed by the HTTP extractors and the
//! real-time handshake: a bearer token maps to a user identity or to nothing.
//! A malformed token is never an error at this seam, only an absent identity.

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::jwt::validate_jwt_token;

/// Resolves a bearer token to the user identity it was issued for.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<String>;
}

/// HS256 JWT verifier; the identity is the `sub` claim.
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    config: AuthConfig,
}

impl JwtVerifier {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Option<String> {
        validate_jwt_token(token, &self.config)
            .ok()
            .map(|claims| claims.sub)
    }
}

/// Shared authentication backend.
///
/// Domain states expose this via `FromRef` so the extractors can reach it:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthBackend {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Backend that validates HS256 tokens with the given configuration
    pub fn jwt(config: AuthConfig) -> Self {
        Self::new(Arc::new(JwtVerifier::new(config)))
    }

    /// Resolve a token to a user identity; `None` for anything unverifiable
    pub fn verify(&self, token: &str) -> Option<String> {
        self.verifier.verify(token)
    }

    /// Like [`verify`](Self::verify) but tolerates an absent token
    pub fn verify_optional(&self, token: Option<&str>) -> Option<String> {
        token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .and_then(|t| self.verify(t))
    }
}

impl std::fmt::Debug for AuthBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthBackend").finish_non_exhaustive()
    }
}
