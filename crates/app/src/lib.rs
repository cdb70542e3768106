//! AgentChat application composition root
//!
//! Composes the conversations API and the real-time endpoints into a single
//! application sharing one Connection Registry.

mod health;

use std::sync::Arc;

use agentchat_auth::{AuthBackend, AuthConfig};
use agentchat_common::Config;
use agentchat_conversations::{
    ChatOrchestrator, ConversationsState, MessageStore, ModelCatalog, PgMessageStore,
};
use agentchat_llm::{LlmConfig, LlmService, LlmServiceFactory};
use agentchat_realtime::{ConnectionRegistry, RealtimeState};
use axum::{http::HeaderValue, Router};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Collaborators the application is built from
pub struct AppServices {
    pub store: Arc<dyn MessageStore>,
    pub llm: Arc<dyn LlmService>,
    pub auth: AuthBackend,
    /// Outbound queue depth per WebSocket connection
    pub send_buffer: usize,
}

/// The composed router plus the shared handles the binary needs at
/// startup and shutdown
pub struct App {
    pub router: Router,
    pub registry: Arc<ConnectionRegistry>,
    pub catalog: Arc<ModelCatalog>,
}

/// Build the production application from configuration and a database pool
pub fn create_app(config: &Config, pool: PgPool) -> Result<App, anyhow::Error> {
    let auth = AuthBackend::jwt(AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    });

    let llm = LlmServiceFactory::create(LlmConfig {
        provider: config.llm_provider.clone(),
        base_url: config.ollama_base_url.clone(),
        generation_timeout: config.generation_timeout(),
        pull_timeout: config.pull_timeout(),
        list_timeout: config.model_list_timeout(),
    })?;

    Ok(compose(AppServices {
        store: Arc::new(PgMessageStore::new(pool)),
        llm: Arc::from(llm),
        auth,
        send_buffer: config.ws_send_buffer,
    }))
}

/// Wire the services together and merge every router
pub fn compose(services: AppServices) -> App {
    let registry = Arc::new(ConnectionRegistry::new(services.auth.clone()));
    let catalog = Arc::new(ModelCatalog::new(services.llm.clone()));
    let health_state = health::HealthState {
        registry: registry.clone(),
        store: services.store.clone(),
    };
    let chat = Arc::new(ChatOrchestrator::new(
        services.store,
        services.llm.clone(),
        catalog.clone(),
        registry.clone(),
    ));

    let conversations_state = ConversationsState {
        chat,
        llm: services.llm,
        auth: services.auth,
    };
    let realtime_state = RealtimeState::new(registry.clone(), services.send_buffer);

    let router = Router::new()
        .merge(health::routes().with_state(health_state))
        .nest(
            "/api",
            agentchat_conversations::routes().with_state(conversations_state),
        )
        .merge(agentchat_realtime::routes().with_state(realtime_state));

    App {
        router,
        registry,
        catalog,
    }
}

/// CORS for the browser client; any origin when none is configured
pub fn cors_layer(frontend_origin: Option<&str>) -> CorsLayer {
    match frontend_origin.and_then(|origin| HeaderValue::from_str(origin).ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}
