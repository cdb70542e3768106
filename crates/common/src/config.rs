//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    /// Token verification
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,

    /// Generation backend (Ollama)
    pub llm_provider: String,
    pub ollama_base_url: String,
    pub generation_timeout_secs: u64,
    pub pull_timeout_secs: u64,
    pub model_list_timeout_secs: u64,

    /// Real-time delivery
    pub ws_send_buffer: usize,

    /// HTTP
    pub frontend_origin: Option<String>,

    /// Runtime configuration
    pub rust_log: String,
    pub log_format: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET is required"))?,
            jwt_issuer: env::var("JWT_ISSUER").ok(),
            jwt_audience: env::var("JWT_AUDIENCE").ok(),

            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string()),
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.to_string()),
            generation_timeout_secs: parse_var("GENERATION_TIMEOUT_SECS", 30),
            pull_timeout_secs: parse_var("PULL_TIMEOUT_SECS", 300),
            model_list_timeout_secs: parse_var("MODEL_LIST_TIMEOUT_SECS", 5),

            ws_send_buffer: parse_var("WS_SEND_BUFFER", 64),

            frontend_origin: env::var("FRONTEND_ORIGIN").ok(),

            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info,agentchat_realtime=debug,agentchat_conversations=debug".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            port: parse_var("PORT", 8000),
        };

        Ok(config)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }

    pub fn model_list_timeout(&self) -> Duration {
        Duration::from_secs(self.model_list_timeout_secs)
    }
}

/// Read and parse an optional variable, falling back to `default` when it is
/// unset or malformed
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Ignoring malformed config value");
            default
        }),
        Err(_) => default,
    }
}
