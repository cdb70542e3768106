//! Stage machine for one chat request
//!
//! Received → ConversationResolved → UserMessagePersisted → ResponseGenerated
//! → AssistantMessagePersisted → Broadcast → Completed, with Failed reachable
//! from every non-terminal stage.

pub use agentchat_common::StateError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    ConversationResolved,
    UserMessagePersisted,
    ResponseGenerated,
    AssistantMessagePersisted,
    Broadcast,
    Completed,
    Failed,
}

impl PipelineStage {
    /// Get all valid next stages from the current stage
    pub fn valid_transitions(&self) -> &'static [PipelineStage] {
        match self {
            Self::Received => &[Self::ConversationResolved, Self::Failed],
            Self::ConversationResolved => &[Self::UserMessagePersisted, Self::Failed],
            Self::UserMessagePersisted => &[Self::ResponseGenerated, Self::Failed],
            Self::ResponseGenerated => &[Self::AssistantMessagePersisted, Self::Failed],
            Self::AssistantMessagePersisted => &[Self::Broadcast, Self::Failed],
            Self::Broadcast => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::ConversationResolved => "conversation_resolved",
            Self::UserMessagePersisted => "user_message_persisted",
            Self::ResponseGenerated => "response_generated",
            Self::AssistantMessagePersisted => "assistant_message_persisted",
            Self::Broadcast => "broadcast",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks the stage of a single in-flight request
#[derive(Debug)]
pub struct Pipeline {
    stage: PipelineStage,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            stage: PipelineStage::Received,
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Move to `next`, rejecting anything out of order
    pub fn advance(&mut self, next: PipelineStage) -> Result<PipelineStage, StateError> {
        if self.stage.is_terminal() {
            return Err(StateError::TerminalState(self.stage.to_string()));
        }
        if !self.stage.valid_transitions().contains(&next) {
            return Err(StateError::InvalidTransition {
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }

        tracing::debug!(from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
        Ok(next)
    }

    /// Mark the request failed; a no-op once terminal
    pub fn fail(&mut self) {
        if !self.stage.is_terminal() {
            tracing::debug!(from = %self.stage, "Pipeline failed");
            self.stage = PipelineStage::Failed;
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
