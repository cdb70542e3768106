//! Generation backend for AgentChat
//!
//! `LlmService` is the capability the chat pipeline consumes: list installed
//! models, generate a reply for a prompt within a bounded time, and pull a
//! model (a long-running operation with its own timeout class).
//!
//! Implementations:
//! - [`OllamaService`]: a local Ollama daemon over HTTP
//! - [`MockLlmService`]: deterministic, scriptable replies for tests and offline runs

mod mock;
mod ollama;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use mock::MockLlmService;
pub use ollama::OllamaService;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Errors from the generation backend.
///
/// Every variant is recoverable from the chat pipeline's point of view: the
/// caller degrades to a fallback reply instead of failing the request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("Generation backend unavailable: {0}")]
    Unavailable(String),

    #[error("Generation backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected response: {0}")]
    Response(String),

    #[error("No model available")]
    NoModel,
}

/// A model installed on the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: String,
}

impl ModelInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            modified_at: String::new(),
        }
    }
}

/// Sampling options forwarded to the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// A single non-streaming generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Generated text plus whatever usage the backend reported
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub text: String,
    pub model: String,
    pub output_tokens: Option<u32>,
}

/// Acknowledgement of a completed model pull
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullAck {
    pub model: String,
    pub status: String,
}

/// Backend connection settings and per-operation time budgets
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub base_url: String,
    pub generation_timeout: Duration,
    pub pull_timeout: Duration,
    pub list_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            generation_timeout: Duration::from_secs(30),
            pull_timeout: Duration::from_secs(300),
            list_timeout: Duration::from_secs(5),
        }
    }
}

/// Generation backend capability
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Names (and metadata) of the models installed on the backend
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError>;

    /// Generate a reply; bounded by the generation timeout
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;

    /// Download a model; bounded by the (much longer) pull timeout
    async fn pull(&self, model: &str) -> Result<PullAck, LlmError>;

    /// Where the backend lives, for health reporting
    fn base_url(&self) -> &str;

    /// Time budget a caller should enforce around [`generate`](Self::generate)
    fn generation_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
}

/// Builds the configured `LlmService`
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "ollama" => Ok(Box::new(OllamaService::new(config)?)),
            "mock" => {
                tracing::warn!("Using mock LLM service");
                Ok(Box::new(MockLlmService::new()))
            }
            other => Err(LlmError::Request(format!(
                "Unknown LLM provider: {}",
                other
            ))),
        }
    }
}
