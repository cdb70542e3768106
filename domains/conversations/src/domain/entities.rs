//! Domain entities for Conversations domain
//!
//! A conversation belongs to one user and owns an ordered list of messages.
//! Neither is ever physically removed: deleting flips `is_active`, and the
//! flag cascades from a conversation to its messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agentchat_common::{Error, Result};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Error,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
            MessageRole::Error => write!(f, "error"),
        }
    }
}

/// Characters of the first message kept in a derived title
pub const TITLE_PREFIX_CHARS: usize = 50;

/// Maximum title length (varchar(200))
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum message length accepted from clients
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Title for a new conversation: the first 50 characters of its opening
/// message, with an ellipsis when anything was cut.
pub fn derive_title(message: &str) -> String {
    let mut chars = message.chars();
    let prefix: String = chars.by_ref().take(TITLE_PREFIX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", prefix)
    } else {
        prefix
    }
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation titled after its opening message
    pub fn new(user_id: impl Into<String>, first_message: &str) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(Error::Validation("Owner is required".to_string()));
        }

        let now = Utc::now();
        Ok(Conversation {
            id: Uuid::new_v4().to_string(),
            user_id,
            title: derive_title(first_message),
            message_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether `user_id` may act on this conversation
    pub fn is_accessible_by(&self, user_id: &str) -> bool {
        self.is_active && self.user_id == user_id
    }

    /// Validate a replacement title
    pub fn validate_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(Error::Validation("Title cannot be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Error::Validation(format!(
                "Title must be at most {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        Ok(())
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: String,
    pub content: String,
    pub role: MessageRole,
    /// Author; `None` for generated replies
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Message {
    /// Create a new user message
    pub fn new_user(
        conversation_id: impl Into<String>,
        content: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self> {
        Self::build(
            conversation_id.into(),
            content.into(),
            MessageRole::User,
            Some(user_id.into()),
        )
    }

    /// Create a new assistant message (no author)
    pub fn new_assistant(
        conversation_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self> {
        Self::build(
            conversation_id.into(),
            content.into(),
            MessageRole::Assistant,
            None,
        )
    }

    fn build(
        conversation_id: String,
        content: String,
        role: MessageRole,
        user_id: Option<String>,
    ) -> Result<Self> {
        Self::validate_content(&content, role)?;

        Ok(Message {
            id: Uuid::new_v4(),
            conversation_id,
            content,
            role,
            user_id,
            created_at: Utc::now(),
            is_active: true,
        })
    }

    /// Client text is taken verbatim as long as it is 1..=4000 characters;
    /// generated replies must carry visible text.
    fn validate_content(content: &str, role: MessageRole) -> Result<()> {
        if content.is_empty() {
            return Err(Error::Validation(
                "Message content cannot be empty".to_string(),
            ));
        }
        if role == MessageRole::User && content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(Error::Validation(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }
        if role == MessageRole::Assistant && content.trim().is_empty() {
            return Err(Error::Validation(
                "Generated reply cannot be whitespace-only".to_string(),
            ));
        }
        Ok(())
    }
}
