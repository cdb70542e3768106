//! Message Store: persistence capability for conversations and messages

#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod postgres;

use agentchat_common::Result;

use crate::domain::entities::{Conversation, Message};

#[cfg(any(test, feature = "test-support"))]
pub use memory::InMemoryMessageStore;
pub use postgres::PgMessageStore;

/// Persistence operations used by the chat services.
///
/// Every write keeps `message_count` equal to the number of active messages
/// in the conversation. Lookups by owner only ever return active rows.
#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Active conversation with this id owned by `user_id`
    async fn find_active_conversation(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Conversation>>;

    /// Insert a conversation together with its opening message, atomically
    async fn create_conversation(
        &self,
        conversation: &Conversation,
        first_message: &Message,
    ) -> Result<Conversation>;

    /// Insert a message into an active conversation, recount it and touch
    /// `updated_at`. Returns the new message count; `NotFound` when the
    /// conversation is missing or soft deleted.
    async fn append_message(&self, message: &Message) -> Result<i32>;

    async fn count_active_messages(&self, conversation_id: &str) -> Result<i64>;

    /// Active conversations of a user, most recently updated first
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>>;

    /// Active messages of a conversation, oldest first
    async fn list_messages(
        &self,
        conversation_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Message>>;

    /// Deactivate an owned, active conversation and all of its messages.
    /// Returns `false` when there was nothing the user could delete.
    async fn soft_delete(&self, id: &str, user_id: &str) -> Result<bool>;

    /// Retitle an owned, active conversation
    async fn rename(&self, id: &str, user_id: &str, title: &str) -> Result<bool>;

    /// Cheap round trip proving the store is reachable
    async fn ping(&self) -> Result<()>;
}
