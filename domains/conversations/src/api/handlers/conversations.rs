//! Conversation management API handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use agentchat_auth::AuthUser;
use agentchat_common::{Error, Pagination, Result, ValidatedJson};

use crate::api::middleware::ConversationsState;
use crate::domain::entities::Conversation;
use crate::service::History;

const NOT_FOUND: &str = "Conversation not found or access denied";

/// Request for renaming a conversation
#[derive(Debug, Deserialize, Validate)]
pub struct RenameConversationRequest {
    #[validate(length(min = 1, max = 200))]
    pub new_title: String,
}

/// Conversation response DTO
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            title: c.title,
            message_count: c.message_count,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationResponse>,
}

/// List the caller's active conversations, most recent first
pub async fn list_conversations(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
) -> Result<Json<ConversationListResponse>> {
    let convs = state.chat.list_conversations(&ctx.user_id).await?;
    Ok(Json(ConversationListResponse {
        conversations: convs.into_iter().map(Into::into).collect(),
    }))
}

/// Page through a conversation's messages
pub async fn get_history(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
) -> Result<Json<History>> {
    let history = state
        .chat
        .get_history(&id, &ctx.user_id, page)
        .await?
        .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))?;
    Ok(Json(history))
}

/// Soft delete a conversation
pub async fn delete_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    if !state.chat.delete_conversation(&id, &ctx.user_id).await? {
        return Err(Error::NotFound(NOT_FOUND.to_string()));
    }
    Ok(Json(json!({ "message": "Conversation deleted successfully" })))
}

/// Rename a conversation
pub async fn rename_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<RenameConversationRequest>,
) -> Result<Json<Value>> {
    if !state
        .chat
        .rename_conversation(&id, &ctx.user_id, &req.new_title)
        .await?
    {
        return Err(Error::NotFound(NOT_FOUND.to_string()));
    }
    Ok(Json(json!({ "message": "Conversation renamed successfully" })))
}
