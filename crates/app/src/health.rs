//! Liveness and system status endpoints

use std::sync::Arc;

use agentchat_conversations::MessageStore;
use agentchat_realtime::{Channel, ConnectionRegistry};
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Map, Value};

const APP_NAME: &str = "AgentChat";
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct HealthState {
    pub registry: Arc<ConnectionRegistry>,
    pub store: Arc<dyn MessageStore>,
}

pub fn routes() -> Router<HealthState> {
    Router::new()
        .route("/health", get(liveness))
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/health/", get(health_check))
        .route("/api/v1/health/status", get(system_status))
        .route("/api/v1/health/info", get(app_info))
}

/// Process is up; touches nothing
async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Store reachability plus the live connection total
async fn health_check(State(state): State<HealthState>) -> Json<Value> {
    let database = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the store");
            "unavailable"
        }
    };

    let status = if database == "connected" { "healthy" } else { "degraded" };

    Json(json!({
        "status": status,
        "version": VERSION,
        "database": database,
        "websocket_connections": state.registry.count(None).await,
    }))
}

/// Live connection counts per channel
async fn system_status(State(state): State<HealthState>) -> Json<Value> {
    let mut channels = Map::new();
    for channel in Channel::ALL {
        channels.insert(
            channel.as_str().to_string(),
            json!(state.registry.count(Some(channel)).await),
        );
    }

    Json(json!({
        "app_name": APP_NAME,
        "version": VERSION,
        "debug": cfg!(debug_assertions),
        "websocket_channels": channels,
        "total_connections": state.registry.count(None).await,
    }))
}

async fn app_info() -> Json<Value> {
    Json(json!({
        "message": APP_NAME,
        "version": VERSION,
        "status": "running",
    }))
}
