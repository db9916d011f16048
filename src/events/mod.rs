use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::message::message_models::MessageResponse;

/// Pushed to a receiver when someone sends them a message, so clients can
/// refresh their conversation list without polling. Emitted on every send,
/// not only the first message of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationNotification {
    pub receiver_id: Uuid,
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub image: Option<String>,
    pub is_online: bool,
    pub seen: bool,
    pub last_message: String,
    pub last_message_sender: bool,
    pub last_message_created_at: DateTime<Utc>,
}

impl ConversationNotification {
    pub fn addressed_to(&self, user_id: Uuid) -> bool {
        self.receiver_id == user_id
    }
}

/// In-process pub/sub for mutation events. Fan-out is best-effort: a publish
/// with no live subscribers is dropped, and a lagging subscriber loses the
/// overwritten events, not the whole stream.
#[derive(Clone)]
pub struct EventBus {
    message_created: broadcast::Sender<MessageResponse>,
    new_conversation: broadcast::Sender<ConversationNotification>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (message_created, _) = broadcast::channel(capacity);
        let (new_conversation, _) = broadcast::channel(capacity);
        Self {
            message_created,
            new_conversation,
        }
    }

    pub fn publish_message_created(&self, message: MessageResponse) {
        if self.message_created.send(message).is_err() {
            tracing::debug!("MessageCreated published with no subscribers");
        }
    }

    pub fn publish_new_conversation(&self, notification: ConversationNotification) {
        if self.new_conversation.send(notification).is_err() {
            tracing::debug!("NewConversation published with no subscribers");
        }
    }

    pub fn subscribe_message_created(&self) -> broadcast::Receiver<MessageResponse> {
        self.message_created.subscribe()
    }

    pub fn subscribe_new_conversation(&self) -> broadcast::Receiver<ConversationNotification> {
        self.new_conversation.subscribe()
    }
}

/// Subscriber filter for the message stream: the event's sender/receiver pair
/// must equal the two requested ids in either order. A missing id never
/// matches, so a stream opened without both filters stays silent.
pub fn message_matches_pair(
    message: &MessageResponse,
    auth_user_id: Option<Uuid>,
    user_id: Option<Uuid>,
) -> bool {
    let (Some(auth_user_id), Some(user_id)) = (auth_user_id, user_id) else {
        return false;
    };

    let involves = |id: Uuid| message.sender.id == id || message.receiver.id == id;
    involves(auth_user_id) && involves(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::user_models::UserResponse;

    fn user(id: Uuid) -> UserResponse {
        UserResponse {
            id,
            username: format!("user-{}", id.simple()),
            full_name: "Test User".to_string(),
            image: None,
            is_online: false,
        }
    }

    fn message(sender: Uuid, receiver: Uuid) -> MessageResponse {
        MessageResponse {
            id: Uuid::new_v4(),
            sender: user(sender),
            receiver: user(receiver),
            content: "hi".to_string(),
            seen: false,
            is_first_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn notification(receiver_id: Uuid) -> ConversationNotification {
        let sender = Uuid::new_v4();
        ConversationNotification {
            receiver_id,
            id: sender,
            username: "sender".to_string(),
            full_name: "Sender".to_string(),
            image: None,
            is_online: true,
            seen: false,
            last_message: "hi".to_string(),
            last_message_sender: false,
            last_message_created_at: Utc::now(),
        }
    }

    #[test]
    fn test_pair_filter_matches_both_directions() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(message_matches_pair(&message(a, b), Some(a), Some(b)));
        assert!(message_matches_pair(&message(b, a), Some(a), Some(b)));
    }

    #[test]
    fn test_pair_filter_rejects_third_party() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        assert!(!message_matches_pair(&message(a, c), Some(a), Some(b)));
        assert!(!message_matches_pair(&message(c, b), Some(a), Some(b)));
    }

    #[test]
    fn test_pair_filter_requires_both_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let msg = message(a, b);

        assert!(!message_matches_pair(&msg, Some(a), None));
        assert!(!message_matches_pair(&msg, None, Some(b)));
        assert!(!message_matches_pair(&msg, None, None));
    }

    #[test]
    fn test_notification_addressing() {
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();

        assert!(notification(x).addressed_to(x));
        assert!(!notification(x).addressed_to(y));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let bus = EventBus::new(16);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        // Must not panic or error.
        bus.publish_message_created(message(a, b));
        bus.publish_new_conversation(notification(b));
    }

    #[tokio::test]
    async fn test_fan_out_to_multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe_message_created();
        let mut rx2 = bus.subscribe_message_created();

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        bus.publish_message_created(message(a, b));

        let got1 = rx1.recv().await.unwrap();
        let got2 = rx2.recv().await.unwrap();
        assert_eq!(got1.sender.id, a);
        assert_eq!(got2.receiver.id, b);
    }

    #[tokio::test]
    async fn test_filtered_stream_drops_third_party_events() {
        use tokio_stream::{wrappers::BroadcastStream, StreamExt};

        let bus = EventBus::new(16);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let rx = bus.subscribe_message_created();
        let mut stream = BroadcastStream::new(rx).filter_map(move |result| match result {
            Ok(m) if message_matches_pair(&m, Some(a), Some(b)) => Some(m),
            _ => None,
        });

        // A third-party message first, then one between the pair.
        bus.publish_message_created(message(a, c));
        bus.publish_message_created(message(b, a));

        let got = stream.next().await.unwrap();
        assert_eq!(got.sender.id, b);
        assert_eq!(got.receiver.id, a);
    }

    #[tokio::test]
    async fn test_subscription_opened_after_publish_misses_event() {
        let bus = EventBus::new(16);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        bus.publish_new_conversation(notification(a));

        let mut rx = bus.subscribe_new_conversation();
        bus.publish_new_conversation(notification(b));

        let got = rx.recv().await.unwrap();
        assert_eq!(got.receiver_id, b);
    }
}
