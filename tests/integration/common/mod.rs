//! Common test utilities and fixtures for integration tests
//!
//! The application is composed exactly as in production, with the in-memory
//! Message Store and the mock generation backend standing in for Postgres and
//! Ollama.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use serde_json::Value;
use uuid::Uuid;

use agentchat_app::{compose, App, AppServices};
use agentchat_auth::{AuthBackend, AuthConfig, TokenClaims};
use agentchat_conversations::InMemoryMessageStore;
use agentchat_llm::MockLlmService;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_only"; // pragma: allowlist secret

/// Composed application plus handles on its test doubles
#[allow(dead_code)]
pub struct TestApp {
    pub app: App,
    pub store: Arc<InMemoryMessageStore>,
    pub llm: MockLlmService,
}

impl TestApp {
    /// Application backed by the echoing mock backend, catalog loaded
    pub async fn new() -> Result<Self> {
        Self::with_llm(MockLlmService::new()).await
    }

    /// Application backed by the given mock backend, catalog loaded
    pub async fn with_llm(llm: MockLlmService) -> Result<Self> {
        let store = Arc::new(InMemoryMessageStore::new());
        let app = compose(AppServices {
            store: store.clone(),
            llm: Arc::new(llm.clone()),
            auth: AuthBackend::jwt(AuthConfig {
                jwt_secret: TEST_JWT_SECRET.to_string(),
                issuer: None,
                audience: None,
            }),
            send_buffer: 16,
        });

        // A failing backend leaves the catalog empty, which is what those tests want
        let _ = app.catalog.refresh().await;

        Ok(Self { app, store, llm })
    }

    pub fn router(&self) -> Router {
        self.app.router.clone()
    }
}

/// Fresh user identity and a token for it
pub fn test_user() -> (String, String) {
    let user_id = format!("user-{}", Uuid::new_v4().simple());
    let jwt = create_test_jwt(&user_id).expect("token");
    (user_id, jwt)
}

/// Create a test JWT token for a user
pub fn create_test_jwt(user_id: &str) -> Result<String> {
    use jsonwebtoken::{Algorithm, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp() as u64;
    let claims = TokenClaims {
        sub: user_id.to_string(),
        exp: now + 3600, // 1 hour
        iat: Some(now),
    };

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_ref()),
    )?;
    Ok(token)
}

/// Build a request, authenticated when a token is given
pub fn request(method: Method, uri: &str, jwt: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(jwt) = jwt {
        builder = builder.header("authorization", format!("Bearer {}", jwt));
    }

    match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Parse response body as JSON Value
pub async fn parse_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
