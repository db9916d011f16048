use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;

use super::message_models::Message;

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, sender_id: Uuid, receiver_id: Uuid, content: &str) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (sender_id, receiver_id, content)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    /// Full history between two users, either direction, oldest update first.
    pub async fn find_between(&self, user_id: Uuid, other_user_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages
             WHERE (sender_id = $1 AND receiver_id = $2)
                OR (sender_id = $2 AND receiver_id = $1)
             ORDER BY updated_at ASC",
        )
        .bind(user_id)
        .bind(other_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Newest message per distinct sender among everything the user sent or
    /// received. Grouping is by sender only: when the user has sent several
    /// messages since a partner's last reply, the partner's group holds their
    /// older message, so the conversation list can show a stale entry for
    /// that partner.
    pub async fn latest_per_sender(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT DISTINCT ON (sender_id) *
             FROM messages
             WHERE sender_id = $1 OR receiver_id = $1
             ORDER BY sender_id, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Marks every unseen message from `sender_id` to `receiver_id` as seen.
    /// Returns how many rows matched.
    pub async fn mark_seen(&self, sender_id: Uuid, receiver_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE messages
             SET seen = true, updated_at = NOW()
             WHERE sender_id = $1 AND receiver_id = $2 AND seen = false",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
