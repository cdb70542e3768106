//! JWT claims types

use serde::{Deserialize, Serialize};

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user identity)
    pub sub: String,
    /// Expires at
    pub exp: u64,
    /// Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}
