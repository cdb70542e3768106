//! Chat message and model selection handlers

use axum::{extract::State, Json};

use agentchat_auth::AuthUser;
use agentchat_common::{Error, Result, ValidatedJson};

use crate::api::middleware::ConversationsState;
use crate::service::{ChatReply, ChatRequest, ModelSnapshot};

/// Send a chat message and get the (possibly degraded) reply
pub async fn send_message(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<ChatRequest>,
) -> Result<Json<ChatReply>> {
    let reply = state.chat.process_message(req, &ctx.user_id).await?;
    Ok(Json(reply))
}

/// Installed models and the current default
pub async fn get_models(State(state): State<ConversationsState>) -> Json<ModelSnapshot> {
    Json(state.chat.catalog().snapshot().await)
}

/// Re-query the backend and reselect the default model
pub async fn refresh_models(
    AuthUser(_ctx): AuthUser,
    State(state): State<ConversationsState>,
) -> Result<Json<ModelSnapshot>> {
    let snapshot = state
        .chat
        .catalog()
        .refresh()
        .await
        .map_err(|e| Error::ServiceUnavailable(e.to_string()))?;
    Ok(Json(snapshot))
}
