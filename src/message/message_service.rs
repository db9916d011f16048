use std::cmp::Ordering;

use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    events::{ConversationNotification, EventBus},
    message::{
        message_dto::ConversationSummary,
        message_models::{Message, MessageResponse},
        message_repository::MessageRepository,
    },
    user::{user_models::User, user_repository::UserRepository, UserResponse},
};

#[derive(Clone)]
pub struct MessageService {
    repo: MessageRepository,
    user_repo: UserRepository,
    events: EventBus,
}

impl MessageService {
    pub fn new(repo: MessageRepository, user_repo: UserRepository, events: EventBus) -> Self {
        Self {
            repo,
            user_repo,
            events,
        }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))
    }

    /// Full history between the two users, both directions, with sender and
    /// receiver expanded, ordered by update time ascending.
    pub async fn get_messages(
        &self,
        auth_user_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<MessageResponse>> {
        let auth_user = UserResponse::from(self.require_user(auth_user_id).await?);
        let other_user = UserResponse::from(self.require_user(user_id).await?);

        let messages = self.repo.find_between(auth_user_id, user_id).await?;

        let responses = messages
            .into_iter()
            .map(|message| {
                let (sender, receiver) = if message.sender_id == auth_user_id {
                    (auth_user.clone(), other_user.clone())
                } else {
                    (other_user.clone(), auth_user.clone())
                };
                MessageResponse::expand(message, sender, receiver)
            })
            .collect();

        Ok(responses)
    }

    /// The user's conversation list: each partner with the latest exchanged
    /// message attached, newest conversation first.
    pub async fn get_conversations(&self, auth_user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        let partners = self.user_repo.find_partners(auth_user_id).await?;
        let latest = self.repo.latest_per_sender(auth_user_id).await?;

        Ok(build_conversations(partners, &latest))
    }

    pub async fn create_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<MessageResponse> {
        let sender = self.require_user(sender_id).await?;
        let receiver = self.require_user(receiver_id).await?;

        let message = self.repo.create(sender_id, receiver_id, content).await?;
        let mut response =
            MessageResponse::expand(message, sender.clone().into(), receiver.into());

        self.events.publish_message_created(response.clone());

        if !self.user_repo.has_partner(sender_id, receiver_id).await? {
            self.user_repo.add_partner_pair(sender_id, receiver_id).await?;
            response.is_first_message = Some(true);
            tracing::debug!(
                "New conversation opened between {} and {}",
                sender_id,
                receiver_id
            );
        }

        self.events.publish_new_conversation(ConversationNotification {
            receiver_id,
            id: sender.id,
            username: sender.username,
            full_name: sender.full_name,
            image: sender.image,
            is_online: sender.is_online,
            seen: false,
            last_message: response.content.clone(),
            last_message_sender: false,
            last_message_created_at: response.created_at,
        });

        Ok(response)
    }

    /// Flips every unseen message from `sender_id` to `receiver_id` to seen
    /// and reports how many matched. Write failures propagate, so a zero here
    /// always means "nothing was unseen".
    pub async fn update_message_seen(&self, sender_id: Uuid, receiver_id: Uuid) -> Result<u64> {
        self.repo.mark_seen(sender_id, receiver_id).await
    }
}

/// Joins the partner list against the latest-message-per-sender set. A
/// partner is looked up as the tracked sender first (they wrote last), then
/// as the tracked receiver (the listing user wrote last); a partner matching
/// neither keeps their profile fields with no message attached.
fn build_conversations(partners: Vec<User>, latest: &[Message]) -> Vec<ConversationSummary> {
    let mut conversations: Vec<ConversationSummary> = partners
        .into_iter()
        .map(|partner| {
            let as_sender = latest.iter().find(|m| m.sender_id == partner.id);
            let as_receiver = latest.iter().find(|m| m.receiver_id == partner.id);

            let (entry, partner_wrote) = match (as_sender, as_receiver) {
                (Some(m), _) => (Some(m), true),
                (None, Some(m)) => (Some(m), false),
                (None, None) => (None, false),
            };

            ConversationSummary {
                id: partner.id,
                username: partner.username,
                full_name: partner.full_name,
                image: partner.image,
                is_online: partner.is_online,
                seen: entry.map(|m| m.seen),
                last_message: entry.map(|m| m.content.clone()),
                last_message_sender: entry.map(|_| !partner_wrote),
                last_message_created_at: entry.map(|m| m.created_at),
            }
        })
        .collect();

    // Newest conversation first, comparing the RFC 3339 rendering of the
    // timestamp; entries without a message sort last.
    conversations.sort_by(|a, b| {
        match (&a.last_message_created_at, &b.last_message_created_at) {
            (Some(ta), Some(tb)) => tb.to_rfc3339().cmp(&ta.to_rfc3339()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });

    conversations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: username.to_uppercase(),
            image: None,
            is_online: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn message(sender_id: Uuid, receiver_id: Uuid, content: &str, minutes_ago: i64) -> Message {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Message {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: content.to_string(),
            seen: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_partner_who_wrote_last_is_not_flagged_as_sender() {
        let alice = user("alice");
        let bob_id = Uuid::new_v4();

        // Alice wrote the tracked message, so from Bob's perspective the
        // last message was not his.
        let latest = vec![message(alice.id, bob_id, "hi", 1)];
        let conversations = build_conversations(vec![alice.clone()], &latest);

        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id, alice.id);
        assert_eq!(conversations[0].last_message.as_deref(), Some("hi"));
        assert_eq!(conversations[0].last_message_sender, Some(false));
        assert_eq!(conversations[0].seen, Some(false));
    }

    #[test]
    fn test_partner_looked_up_as_receiver_flags_listing_user_as_sender() {
        let alice = user("alice");
        let bob_id = Uuid::new_v4();

        // Bob wrote last; Alice only appears as the receiver of his group.
        let latest = vec![message(bob_id, alice.id, "you there?", 2)];
        let conversations = build_conversations(vec![alice.clone()], &latest);

        assert_eq!(conversations[0].last_message.as_deref(), Some("you there?"));
        assert_eq!(conversations[0].last_message_sender, Some(true));
    }

    #[test]
    fn test_sender_branch_wins_over_receiver_branch() {
        let alice = user("alice");
        let bob_id = Uuid::new_v4();

        let from_alice = message(alice.id, bob_id, "from alice", 5);
        let to_alice = message(bob_id, alice.id, "to alice", 1);
        let conversations = build_conversations(vec![alice], &[to_alice, from_alice]);

        assert_eq!(conversations[0].last_message.as_deref(), Some("from alice"));
        assert_eq!(conversations[0].last_message_sender, Some(false));
    }

    #[test]
    fn test_conversations_sorted_newest_first() {
        let alice = user("alice");
        let carol = user("carol");
        let bob_id = Uuid::new_v4();

        let latest = vec![
            message(alice.id, bob_id, "old", 60),
            message(carol.id, bob_id, "new", 1),
        ];
        let conversations = build_conversations(vec![alice.clone(), carol.clone()], &latest);

        assert_eq!(conversations[0].id, carol.id);
        assert_eq!(conversations[1].id, alice.id);
    }

    #[test]
    fn test_partner_without_tracked_message_keeps_profile_and_sorts_last() {
        let alice = user("alice");
        let dave = user("dave");
        let bob_id = Uuid::new_v4();

        let latest = vec![message(alice.id, bob_id, "hi", 1)];
        let conversations = build_conversations(vec![dave.clone(), alice.clone()], &latest);

        assert_eq!(conversations[0].id, alice.id);
        assert_eq!(conversations[1].id, dave.id);
        assert_eq!(conversations[1].username, "dave");
        assert!(conversations[1].last_message.is_none());
        assert!(conversations[1].seen.is_none());
        assert!(conversations[1].last_message_created_at.is_none());
    }

    #[test]
    fn test_seen_flag_carried_through() {
        let alice = user("alice");
        let bob_id = Uuid::new_v4();

        let mut seen_message = message(alice.id, bob_id, "hi", 3);
        seen_message.seen = true;
        let conversations = build_conversations(vec![alice], &[seen_message]);

        assert_eq!(conversations[0].seen, Some(true));
    }
}
