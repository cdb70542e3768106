//! Conversations domain state and auth backend integration

use std::sync::Arc;

use agentchat_auth::AuthBackend;
use agentchat_llm::LlmService;
use axum::extract::FromRef;

use crate::service::ChatOrchestrator;

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub chat: Arc<ChatOrchestrator>,
    pub llm: Arc<dyn LlmService>,
    pub auth: AuthBackend,
}

impl FromRef<ConversationsState> for AuthBackend {
    fn from_ref(state: &ConversationsState) -> Self {
        state.auth.clone()
    }
}
