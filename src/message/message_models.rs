use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub seen: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A message with its sender/receiver references expanded to full profiles.
/// `is_first_message` is set only on the response to the send that opened
/// the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender: crate::user::UserResponse,
    pub receiver: crate::user::UserResponse,
    pub content: String,
    pub seen: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_first_message: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageResponse {
    pub fn expand(
        message: Message,
        sender: crate::user::UserResponse,
        receiver: crate::user::UserResponse,
    ) -> Self {
        Self {
            id: message.id,
            sender,
            receiver,
            content: message.content,
            seen: message.seen,
            is_first_message: None,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}
