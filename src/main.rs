mod db;
mod error;
mod events;
mod message;
mod routes;
mod state;
mod user;

use db::{create_pool, run_migrations};
use events::EventBus;
use routes::create_router;
use state::{AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dm_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is not set"))?;

    tracing::info!("Connecting to database...");
    let db = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    // Create the event bus
    let events = EventBus::new(config.event_channel_capacity);

    // Create repositories
    let user_repository = user::UserRepository::new(db.clone());
    let message_repository = message::MessageRepository::new(db.clone());

    // Create services
    let message_service = message::MessageService::new(
        message_repository,
        user_repository.clone(),
        events.clone(),
    );

    // Create application state
    let state = AppState {
        db: db.clone(),
        events,
        user_repository,
        message_service,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
