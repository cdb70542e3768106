//! Chat request pipeline and conversation operations
//!
//! `process_message` persists the user's message, asks the generation backend
//! for a reply, persists that reply and publishes it on the `chat` channel.
//! Generation problems never fail the request: the reply degrades to a fixed
//! marker. Persistence problems always do.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use validator::Validate;

use agentchat_common::{Error, Pagination, Result};
use agentchat_llm::{GenerationOptions, GenerationRequest, GenerationResponse, LlmError, LlmService};
use agentchat_realtime::event::{object, CHAT_MESSAGE_EVENT};
use agentchat_realtime::{Channel, ConnectionRegistry, Event};

use super::catalog::{ModelCatalog, NO_MODEL};
use crate::domain::entities::{Conversation, Message, MAX_MESSAGE_LENGTH};
use crate::domain::pipeline::{Pipeline, PipelineStage};
use crate::repository::MessageStore;

/// Reply stored and returned when generation is unavailable. Clients treat it
/// as a translation key.
pub const SERVICE_UNAVAILABLE: &str = "serviceUnavailable";

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

/// Inbound chat message
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    #[validate(range(min = 1, max = 4000))]
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// Outcome of a processed chat message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: String,
    pub model_used: String,
    pub tokens_used: Option<u32>,
    /// Seconds
    pub processing_time: f64,
    pub timestamp: DateTime<Utc>,
}

/// One page of a conversation's messages
#[derive(Debug, Clone, Serialize)]
pub struct History {
    pub messages: Vec<Message>,
    pub conversation_id: String,
    pub total_messages: i64,
    pub has_more: bool,
}

pub struct ChatOrchestrator {
    store: Arc<dyn MessageStore>,
    llm: Arc<dyn LlmService>,
    catalog: Arc<ModelCatalog>,
    registry: Arc<ConnectionRegistry>,
    generation_timeout: Duration,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<dyn MessageStore>,
        llm: Arc<dyn LlmService>,
        catalog: Arc<ModelCatalog>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        let generation_timeout = llm.generation_timeout();
        Self {
            store,
            llm,
            catalog,
            registry,
            generation_timeout,
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Drive one chat message through the pipeline
    pub async fn process_message(&self, request: ChatRequest, user_id: &str) -> Result<ChatReply> {
        let started = Instant::now();
        let mut pipeline = Pipeline::new();

        match self.run(&mut pipeline, request, user_id, started).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                error!(stage = %pipeline.stage(), user_id, error = %e, "Chat pipeline failed");
                pipeline.fail();
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        pipeline: &mut Pipeline,
        request: ChatRequest,
        user_id: &str,
        started: Instant,
    ) -> Result<ChatReply> {
        if request.message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(Error::Validation(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        let model = match request.model.as_deref().map(str::trim) {
            Some(model) if !model.is_empty() => model.to_string(),
            _ => self.catalog.default_model().await,
        };

        // Resolve the conversation and persist the user's message
        let existing = match request.conversation_id.as_deref() {
            Some(id) => self.store.find_active_conversation(id, user_id).await?,
            None => None,
        };

        let conversation_id = match existing {
            Some(conversation) => {
                advance(pipeline, PipelineStage::ConversationResolved)?;
                let message = Message::new_user(&conversation.id, &request.message, user_id)?;
                self.store.append_message(&message).await?;
                conversation.id
            }
            None => {
                let conversation = Conversation::new(user_id, &request.message)?;
                let message = Message::new_user(&conversation.id, &request.message, user_id)?;
                advance(pipeline, PipelineStage::ConversationResolved)?;
                self.store.create_conversation(&conversation, &message).await?;
                info!(conversation_id = %conversation.id, user_id, "Created conversation");
                conversation.id
            }
        };
        advance(pipeline, PipelineStage::UserMessagePersisted)?;

        let options = GenerationOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
        };
        let (response, tokens_used) = match self.generate(&model, &request.message, options).await {
            Ok(generated) => (generated.text, generated.output_tokens),
            Err(e) => {
                warn!(model = %model, conversation_id = %conversation_id, error = %e, "Generation failed, degrading reply");
                counter!("chat_generation_degraded_total").increment(1);
                (SERVICE_UNAVAILABLE.to_string(), None)
            }
        };
        advance(pipeline, PipelineStage::ResponseGenerated)?;

        let reply = Message::new_assistant(&conversation_id, &response)?;
        let message_count = self.store.append_message(&reply).await?;
        advance(pipeline, PipelineStage::AssistantMessagePersisted)?;

        let timestamp = Utc::now();
        self.publish(&conversation_id, &response, user_id, timestamp).await;
        advance(pipeline, PipelineStage::Broadcast)?;

        advance(pipeline, PipelineStage::Completed)?;
        info!(
            conversation_id = %conversation_id,
            model = %model,
            message_count,
            "Chat message processed"
        );

        Ok(ChatReply {
            response,
            conversation_id,
            model_used: model,
            tokens_used,
            processing_time: started.elapsed().as_secs_f64(),
            timestamp,
        })
    }

    /// Bounded call into the backend; an empty reply counts as a failure
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: GenerationOptions,
    ) -> std::result::Result<GenerationResponse, LlmError> {
        if model == NO_MODEL {
            return Err(LlmError::NoModel);
        }

        let request = GenerationRequest::new(model, prompt).with_options(options);
        let generated = tokio::time::timeout(self.generation_timeout, self.llm.generate(request))
            .await
            .map_err(|_| LlmError::Timeout(self.generation_timeout))??;

        if generated.text.trim().is_empty() {
            return Err(LlmError::Response("empty reply".to_string()));
        }
        Ok(generated)
    }

    /// Best-effort fan-out; delivery problems stay inside the registry
    async fn publish(&self, conversation_id: &str, message: &str, user_id: &str, at: DateTime<Utc>) {
        let event = Event::new(
            CHAT_MESSAGE_EVENT,
            object(json!({
                "conversation_id": conversation_id,
                "message": message,
                "user_id": user_id,
                "timestamp": at.to_rfc3339(),
            })),
        )
        .with_user(Some(user_id.to_string()));

        let delivered = self.registry.broadcast(&event, Channel::Chat).await;
        tracing::debug!(conversation_id, delivered, "Published chat message");
    }

    /// Page through an owned, active conversation
    pub async fn get_history(
        &self,
        conversation_id: &str,
        user_id: &str,
        page: Pagination,
    ) -> Result<Option<History>> {
        if self
            .store
            .find_active_conversation(conversation_id, user_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let total_messages = self.store.count_active_messages(conversation_id).await?;
        let messages = self
            .store
            .list_messages(conversation_id, page.offset(), page.limit())
            .await?;

        Ok(Some(History {
            messages,
            conversation_id: conversation_id.to_string(),
            total_messages,
            has_more: page.has_more(total_messages),
        }))
    }

    pub async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        self.store.list_conversations(user_id).await
    }

    /// Soft delete; `false` when missing, foreign or already deleted
    pub async fn delete_conversation(&self, conversation_id: &str, user_id: &str) -> Result<bool> {
        let deleted = self.store.soft_delete(conversation_id, user_id).await?;
        if deleted {
            info!(conversation_id, user_id, "Conversation deleted");
        }
        Ok(deleted)
    }

    pub async fn rename_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
        new_title: &str,
    ) -> Result<bool> {
        Conversation::validate_title(new_title)?;
        self.store.rename(conversation_id, user_id, new_title).await
    }
}

impl std::fmt::Debug for ChatOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOrchestrator")
            .field("generation_timeout", &self.generation_timeout)
            .finish_non_exhaustive()
    }
}

fn advance(pipeline: &mut Pipeline, stage: PipelineStage) -> Result<()> {
    pipeline
        .advance(stage)
        .map(|_| ())
        .map_err(|e| Error::Internal(e.to_string()))
}
