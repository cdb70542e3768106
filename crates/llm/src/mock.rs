//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"` and by tests across
//! the workspace. Replies are deterministic; failure and stall modes exercise
//! the degraded path of the chat pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{
    GenerationRequest, GenerationResponse, LlmError, LlmService, ModelInfo, PullAck,
};

#[derive(Debug, Clone)]
enum Behavior {
    Echo,
    Reply(String),
    Fail(LlmError),
    Stall,
}

/// Mock LLM service for testing
#[derive(Debug, Clone)]
pub struct MockLlmService {
    behavior: Behavior,
    models: Vec<ModelInfo>,
    generation_timeout: Duration,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLlmService {
    /// Echoes the prompt back and reports a single `mock-model`
    pub fn new() -> Self {
        Self {
            behavior: Behavior::Echo,
            models: vec![ModelInfo::named("mock-model")],
            generation_timeout: Duration::from_secs(30),
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with `text`
    pub fn with_reply(mut self, text: impl Into<String>) -> Self {
        self.behavior = Behavior::Reply(text.into());
        self
    }

    /// Every generation fails as if the backend were down
    pub fn failing(mut self) -> Self {
        self.behavior = Behavior::Fail(LlmError::Unavailable("mock backend down".to_string()));
        self
    }

    /// Generations never complete; callers must enforce their own timeout
    pub fn stalled(mut self) -> Self {
        self.behavior = Behavior::Stall;
        self
    }

    pub fn with_models<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = names.into_iter().map(ModelInfo::named).collect();
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Number of `generate` calls observed so far
    pub fn generate_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl Default for MockLlmService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        match &self.behavior {
            Behavior::Fail(err) => Err(err.clone()),
            _ => Ok(self.models.clone()),
        }
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        tracing::info!(model = %request.model, "Mock LLM service processing generation request");
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }

        let text = match &self.behavior {
            Behavior::Echo => format!("Mock response to: {}", request.prompt),
            Behavior::Reply(text) => text.clone(),
            Behavior::Fail(err) => return Err(err.clone()),
            Behavior::Stall => return std::future::pending().await,
        };

        let output_tokens = Some((text.len() / 4) as u32);
        Ok(GenerationResponse {
            text,
            model: request.model,
            output_tokens,
        })
    }

    async fn pull(&self, model: &str) -> Result<PullAck, LlmError> {
        match &self.behavior {
            Behavior::Fail(err) => Err(err.clone()),
            _ => Ok(PullAck {
                model: model.to_string(),
                status: "success".to_string(),
            }),
        }
    }

    fn base_url(&self) -> &str {
        "mock://"
    }

    fn generation_timeout(&self) -> Duration {
        self.generation_timeout
    }
}
