use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    events::ConversationNotification,
    message::{
        message_dto::{ConversationSummary, MarkSeenRequest, SeenUpdateResponse, SendMessageRequest},
        message_handlers,
        message_models::{Message, MessageResponse},
    },
    state::AppState,
    user::{
        user_dto::UpdatePresenceRequest,
        user_handlers,
        user_models::{User, UserResponse},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::message::message_handlers::send_message,
        crate::message::message_handlers::get_messages,
        crate::message::message_handlers::get_conversations,
        crate::message::message_handlers::mark_messages_seen,
        crate::message::message_handlers::message_stream,
        crate::message::message_handlers::conversation_stream,
        crate::user::user_handlers::get_user,
        crate::user::user_handlers::update_presence,
    ),
    components(
        schemas(
            SendMessageRequest,
            MarkSeenRequest,
            SeenUpdateResponse,
            ConversationSummary,
            ConversationNotification,
            Message,
            MessageResponse,
            User,
            UserResponse,
            UpdatePresenceRequest,
        )
    ),
    tags(
        (name = "messages", description = "Direct message endpoints"),
        (name = "conversations", description = "Conversation list and notification endpoints"),
        (name = "users", description = "User profile endpoints")
    )
)]
struct ApiDoc;

/// Liveness check: verifies the database connection responds.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!("Health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let message_routes = Router::new()
        .route(
            "/",
            post(message_handlers::send_message).get(message_handlers::get_messages),
        )
        .route("/seen", patch(message_handlers::mark_messages_seen))
        .route("/stream", get(message_handlers::message_stream));

    let conversation_routes = Router::new()
        .route(
            "/stream/:auth_user_id",
            get(message_handlers::conversation_stream),
        )
        .route("/:auth_user_id", get(message_handlers::get_conversations));

    let user_routes = Router::new()
        .route("/:id", get(user_handlers::get_user))
        .route("/:id/presence", patch(user_handlers::update_presence));

    let api_routes = Router::new()
        .nest("/messages", message_routes)
        .nest("/conversations", conversation_routes)
        .nest("/users", user_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
