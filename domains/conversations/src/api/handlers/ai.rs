//! Direct generation backend handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use agentchat_auth::AuthUser;
use agentchat_common::{Error, Result, ValidatedJson};
use agentchat_llm::{GenerationRequest, LlmError, ModelInfo};

use crate::api::middleware::ConversationsState;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 4000))]
    pub prompt: String,
    /// Defaults to the catalog's current default
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub response: String,
    pub model: String,
    pub prompt_length: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PullModelRequest {
    #[validate(length(min = 1, max = 200))]
    pub model_name: String,
}

#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub success: bool,
    pub models: Vec<ModelInfo>,
}

fn unavailable(e: LlmError) -> Error {
    Error::ServiceUnavailable(e.to_string())
}

/// Probe the backend; never fails, reports the problem instead
pub async fn health(State(state): State<ConversationsState>) -> Json<Value> {
    let base_url = state.llm.base_url().to_string();
    match state.llm.list_models().await {
        Ok(models) => Json(json!({
            "status": "healthy",
            "models": models.into_iter().map(|m| m.name).collect::<Vec<_>>(),
            "base_url": base_url,
        })),
        Err(e) => Json(json!({
            "status": "error",
            "message": e.to_string(),
            "base_url": base_url,
        })),
    }
}

/// Installed models with size and modification time
pub async fn list_models(
    AuthUser(_ctx): AuthUser,
    State(state): State<ConversationsState>,
) -> Result<Json<ModelListResponse>> {
    let models = state.llm.list_models().await.map_err(unavailable)?;
    Ok(Json(ModelListResponse {
        success: true,
        models,
    }))
}

/// One-off generation outside any conversation
pub async fn generate(
    AuthUser(_ctx): AuthUser,
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>> {
    let model = match req.model.filter(|m| !m.trim().is_empty()) {
        Some(model) => model,
        None => state.chat.catalog().default_model().await,
    };
    let prompt_length = req.prompt.chars().count();

    let generated = state
        .llm
        .generate(GenerationRequest::new(model, req.prompt))
        .await
        .map_err(unavailable)?;

    Ok(Json(GenerateResponse {
        success: true,
        response: generated.text,
        model: generated.model,
        prompt_length,
    }))
}

/// Download a model onto the backend
pub async fn pull_model(
    AuthUser(_ctx): AuthUser,
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<PullModelRequest>,
) -> Result<Json<Value>> {
    let ack = state.llm.pull(&req.model_name).await.map_err(unavailable)?;
    tracing::info!(model = %ack.model, status = %ack.status, "Model pulled");

    Ok(Json(json!({
        "success": true,
        "message": format!("Model {} pulled successfully", ack.model),
        "model": ack.model,
    })))
}
