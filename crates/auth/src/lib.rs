//! Authentication for AgentChat
//!
//! Provides the token verification capability (bearer token to user identity)
//! and an axum extractor that works with any state implementing
//! `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod error;
mod extractors;
mod jwt;

pub use backend::{AuthBackend, JwtVerifier, TokenVerifier};
pub use claims::TokenClaims;
pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::{AuthContext, AuthUser};
