use crate::error::{AppError, Result};
use sqlx::PgPool;
use uuid::Uuid;

use super::user_models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Users the given user has an open conversation with, oldest
    /// conversation first.
    pub async fn find_partners(&self, user_id: Uuid) -> Result<Vec<User>> {
        let partners = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u
             JOIN conversation_partners cp ON cp.partner_id = u.id
             WHERE cp.user_id = $1
             ORDER BY cp.created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(partners)
    }

    pub async fn has_partner(&self, user_id: Uuid, partner_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM conversation_partners
                WHERE user_id = $1 AND partner_id = $2
             )",
        )
        .bind(user_id)
        .bind(partner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Registers each user as the other's conversation partner. Two separate
    /// writes, no transaction: a crash in between leaves a one-sided
    /// partnership until a later send repairs it via ON CONFLICT.
    pub async fn add_partner_pair(&self, user_id: Uuid, partner_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO conversation_partners (user_id, partner_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(partner_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "INSERT INTO conversation_partners (user_id, partner_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(partner_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_online(&self, user_id: Uuid, is_online: bool) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_online = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING *",
        )
        .bind(is_online)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }
}
