//! In-memory Message Store for tests and local runs without Postgres

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;

use agentchat_common::{Error, Result};

use super::MessageStore;
use crate::domain::entities::{Conversation, Message};

#[derive(Debug, Default)]
struct Tables {
    conversations: HashMap<String, Conversation>,
    /// Insertion order doubles as timestamp order
    messages: Vec<Message>,
}

impl Tables {
    fn active_count(&self, conversation_id: &str) -> i32 {
        self.messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && m.is_active)
            .count() as i32
    }

    fn owned_active_mut(&mut self, id: &str, user_id: &str) -> Option<&mut Conversation> {
        self.conversations
            .get_mut(id)
            .filter(|c| c.is_accessible_by(user_id))
    }
}

/// Message Store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as a database error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Raw row regardless of owner or active flag
    pub async fn conversation(&self, id: &str) -> Option<Conversation> {
        self.tables.lock().await.conversations.get(id).cloned()
    }

    /// Every stored message of a conversation, inactive ones included
    pub async fn all_messages(&self, conversation_id: &str) -> Vec<Message> {
        self.tables
            .lock()
            .await
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn find_active_conversation(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Conversation>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .conversations
            .get(id)
            .filter(|c| c.is_accessible_by(user_id))
            .cloned())
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
        first_message: &Message,
    ) -> Result<Conversation> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if tables.conversations.contains_key(&conversation.id) {
            return Err(Error::Internal(format!(
                "Conversation {} already exists",
                conversation.id
            )));
        }

        tables.messages.push(first_message.clone());
        let created = Conversation {
            message_count: tables.active_count(&conversation.id),
            is_active: true,
            ..conversation.clone()
        };
        tables
            .conversations
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn append_message(&self, message: &Message) -> Result<i32> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let active = tables
            .conversations
            .get(&message.conversation_id)
            .is_some_and(|c| c.is_active);
        if !active {
            return Err(Error::NotFound(format!(
                "Conversation {} is not active",
                message.conversation_id
            )));
        }

        tables.messages.push(message.clone());
        let count = tables.active_count(&message.conversation_id);
        if let Some(conv) = tables.conversations.get_mut(&message.conversation_id) {
            conv.message_count = count;
            conv.updated_at = Utc::now();
        }
        Ok(count)
    }

    async fn count_active_messages(&self, conversation_id: &str) -> Result<i64> {
        self.check_available()?;
        Ok(self.tables.lock().await.active_count(conversation_id) as i64)
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        let mut convs: Vec<Conversation> = tables
            .conversations
            .values()
            .filter(|c| c.is_accessible_by(user_id))
            .cloned()
            .collect();
        convs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(convs)
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Message>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && m.is_active)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: &str, user_id: &str) -> Result<bool> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        match tables.owned_active_mut(id, user_id) {
            Some(conv) => {
                conv.is_active = false;
                conv.message_count = 0;
                conv.updated_at = Utc::now();
            }
            None => return Ok(false),
        }

        for message in tables.messages.iter_mut().filter(|m| m.conversation_id == id) {
            message.is_active = false;
        }
        Ok(true)
    }

    async fn rename(&self, id: &str, user_id: &str, title: &str) -> Result<bool> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        match tables.owned_active_mut(id, user_id) {
            Some(conv) => {
                conv.title = title.to_string();
                conv.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }
}
