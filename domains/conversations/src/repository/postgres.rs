//! Postgres-backed Message Store

use agentchat_common::{Error, Result};
use sqlx::PgPool;

use super::MessageStore;
use crate::domain::entities::{Conversation, Message};

#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl MessageStore for PgMessageStore {
    async fn find_active_conversation(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Conversation>> {
        let conv = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, user_id, title, message_count, is_active,
                   created_at, updated_at
            FROM conversations
            WHERE id = $1 AND user_id = $2 AND is_active
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conv)
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
        first_message: &Message,
    ) -> Result<Conversation> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, user_id, title, message_count, is_active,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, 0, TRUE, $4, $5)
            "#,
        )
        .bind(&conversation.id)
        .bind(&conversation.user_id)
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_message(&mut tx, first_message).await?;
        let created = recount(&mut tx, &conversation.id).await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn append_message(&self, message: &Message) -> Result<i32> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes against soft_delete of the same conversation
        let active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM conversations WHERE id = $1 FOR UPDATE",
        )
        .bind(&message.conversation_id)
        .fetch_optional(&mut *tx)
        .await?;

        if active != Some(true) {
            tx.rollback().await?;
            return Err(Error::NotFound(format!(
                "Conversation {} is not active",
                message.conversation_id
            )));
        }

        insert_message(&mut tx, message).await?;
        let conv = recount(&mut tx, &message.conversation_id).await?;
        tx.commit().await?;

        Ok(conv.message_count)
    }

    async fn count_active_messages(&self, conversation_id: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE conversation_id = $1 AND is_active",
        )
        .bind(conversation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let convs = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, user_id, title, message_count, is_active,
                   created_at, updated_at
            FROM conversations
            WHERE user_id = $1 AND is_active
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(convs)
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, content, role, user_id,
                   created_at, is_active
            FROM messages
            WHERE conversation_id = $1 AND is_active
            ORDER BY created_at ASC, seq ASC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(conversation_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn soft_delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE conversations SET
                is_active = FALSE,
                message_count = 0,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND is_active
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE messages SET is_active = FALSE WHERE conversation_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn rename(&self, id: &str, user_id: &str, title: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE conversations SET
                title = $3,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND is_active
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(title)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

async fn insert_message(tx: &mut sqlx::PgConnection, msg: &Message) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO messages (
            id, conversation_id, content, role, user_id,
            created_at, is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(msg.id)
    .bind(&msg.conversation_id)
    .bind(&msg.content)
    .bind(msg.role)
    .bind(&msg.user_id)
    .bind(msg.created_at)
    .bind(msg.is_active)
    .execute(tx)
    .await?;

    Ok(())
}

/// Store the live active-message count and touch `updated_at`
async fn recount(tx: &mut sqlx::PgConnection, conversation_id: &str) -> Result<Conversation> {
    let conv = sqlx::query_as::<_, Conversation>(
        r#"
        UPDATE conversations SET
            message_count = (
                SELECT COUNT(*)::INT FROM messages
                WHERE conversation_id = $1 AND is_active
            ),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, user_id, title, message_count, is_active,
                  created_at, updated_at
        "#,
    )
    .bind(conversation_id)
    .fetch_one(tx)
    .await?;

    Ok(conv)
}
