//! Route definitions for Conversations domain API

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{ai, chat, conversations};
use super::middleware::ConversationsState;

/// Chat pipeline and model selection
fn chat_routes() -> Router<ConversationsState> {
    Router::new()
        .route("/v1/chat/message", post(chat::send_message))
        .route("/v1/chat/models", get(chat::get_models))
        .route("/v1/chat/models/refresh", post(chat::refresh_models))
}

/// Conversation CRUD
fn conversation_routes() -> Router<ConversationsState> {
    Router::new()
        .route("/v1/chat/conversations", get(conversations::list_conversations))
        .route(
            "/v1/chat/conversations/{id}",
            axum::routing::delete(conversations::delete_conversation),
        )
        .route(
            "/v1/chat/conversations/{id}/history",
            get(conversations::get_history),
        )
        .route(
            "/v1/chat/conversations/{id}/rename",
            put(conversations::rename_conversation),
        )
}

/// Direct access to the generation backend
fn ai_routes() -> Router<ConversationsState> {
    Router::new()
        .route("/v1/ai/health", get(ai::health))
        .route("/v1/ai/models", get(ai::list_models))
        .route("/v1/ai/generate", post(ai::generate))
        .route("/v1/ai/pull-model", post(ai::pull_model))
}

/// Create all Conversations domain API routes
pub fn routes() -> Router<ConversationsState> {
    Router::new()
        .merge(chat_routes())
        .merge(conversation_routes())
        .merge(ai_routes())
}
