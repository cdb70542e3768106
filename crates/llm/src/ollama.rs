//! Ollama HTTP backend
//!
//! Talks to a local Ollama daemon:
//! - `GET /api/tags` for installed models
//! - `POST /api/generate` for non-streaming generation
//! - `POST /api/pull` to download a model

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    GenerationRequest, GenerationResponse, LlmConfig, LlmError, LlmService, ModelInfo, PullAck,
};

/// Ollama client
#[derive(Debug, Clone)]
pub struct OllamaService {
    client: Client,
    config: LlmConfig,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    response: String,
    model: Option<String>,
    eval_count: Option<u32>,
}

#[derive(Debug, Serialize)]
struct PullBody<'a> {
    name: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct PullReply {
    #[serde(default)]
    status: String,
}

impl OllamaService {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: LlmConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Map a transport failure onto the backend error taxonomy
    fn transport_error(err: reqwest::Error, budget: Duration) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(budget)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else {
            LlmError::Request(err.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "Ollama returned an error status");
        Err(LlmError::Response(format!("HTTP {}: {}", status, body)))
    }
}

#[async_trait::async_trait]
impl LlmService for OllamaService {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let budget = self.config.list_timeout;
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(budget)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, budget))?;

        let tags: TagsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::Response(format!("Failed to parse model list: {}", e)))?;

        tracing::debug!(count = tags.models.len(), "Listed Ollama models");
        Ok(tags.models)
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let budget = self.config.generation_timeout;
        let body = GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.options.temperature,
                num_predict: request.options.max_tokens,
            },
        };

        tracing::debug!(model = %request.model, prompt_len = request.prompt.len(), "Sending generation request");

        let response = self
            .client
            .post(self.url("/api/generate"))
            .timeout(budget)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, budget))?;

        let reply: GenerateReply = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::Response(format!("Failed to parse generation: {}", e)))?;

        Ok(GenerationResponse {
            text: reply.response,
            model: reply.model.unwrap_or(request.model),
            output_tokens: reply.eval_count,
        })
    }

    async fn pull(&self, model: &str) -> Result<PullAck, LlmError> {
        let budget = self.config.pull_timeout;
        tracing::info!(model, "Pulling model");

        let response = self
            .client
            .post(self.url("/api/pull"))
            .timeout(budget)
            .json(&PullBody {
                name: model,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| Self::transport_error(e, budget))?;

        let reply: PullReply = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::Response(format!("Failed to parse pull status: {}", e)))?;

        Ok(PullAck {
            model: model.to_string(),
            status: if reply.status.is_empty() {
                "success".to_string()
            } else {
                reply.status
            },
        })
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn generation_timeout(&self) -> Duration {
        self.config.generation_timeout
    }
}
