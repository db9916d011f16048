use crate::{db::DbPool, events::EventBus, message::MessageService, user::UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub events: EventBus,
    pub user_repository: UserRepository,
    pub message_service: MessageService,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub event_channel_capacity: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a number"),
            event_channel_capacity: std::env::var("EVENT_CHANNEL_CAPACITY")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .expect("EVENT_CHANNEL_CAPACITY must be a number"),
        }
    }
}
