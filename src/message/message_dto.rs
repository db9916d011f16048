use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    pub sender: Uuid,
    pub receiver: Uuid,
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MarkSeenRequest {
    pub sender: Uuid,
    pub receiver: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SeenUpdateResponse {
    /// Number of messages flipped to seen. Zero means nothing was unseen;
    /// a failed write surfaces as an error response instead.
    pub updated: u64,
}

/// One entry of a user's conversation list: the partner's profile plus the
/// latest exchanged message. The message fields are absent when no tracked
/// message could be located for the partner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub image: Option<String>,
    pub is_online: bool,
    pub seen: Option<bool>,
    pub last_message: Option<String>,
    /// True when the listing user wrote the last message themselves.
    pub last_message_sender: Option<bool>,
    pub last_message_created_at: Option<DateTime<Utc>>,
}
