use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Sse,
    },
    Json,
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::Result,
    events,
    message::{
        message_dto::{ConversationSummary, MarkSeenRequest, SeenUpdateResponse, SendMessageRequest},
        message_models::MessageResponse,
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub auth_user_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct MessageStreamQuery {
    pub auth_user_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Send a message to another user
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message created", body = MessageResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Sender or receiver not found")
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let message = state
        .message_service
        .create_message(payload.sender, payload.receiver, &payload.content)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Get the full message history between two users
#[utoipa::path(
    get,
    path = "/api/messages",
    tag = "messages",
    params(
        ("auth_user_id" = Uuid, Query, description = "Requesting user ID"),
        ("user_id" = Uuid, Query, description = "Conversation partner ID")
    ),
    responses(
        (status = 200, description = "Messages ordered by update time ascending", body = Vec<MessageResponse>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse> {
    let messages = state
        .message_service
        .get_messages(query.auth_user_id, query.user_id)
        .await?;

    Ok((StatusCode::OK, Json(messages)))
}

/// List a user's conversations, newest first
#[utoipa::path(
    get,
    path = "/api/conversations/{auth_user_id}",
    tag = "conversations",
    params(
        ("auth_user_id" = Uuid, Path, description = "Requesting user ID")
    ),
    responses(
        (status = 200, description = "Conversation list", body = Vec<ConversationSummary>)
    )
)]
pub async fn get_conversations(
    State(state): State<AppState>,
    Path(auth_user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let conversations = state
        .message_service
        .get_conversations(auth_user_id)
        .await?;

    Ok((StatusCode::OK, Json(conversations)))
}

/// Mark every unseen message from a sender as seen
#[utoipa::path(
    patch,
    path = "/api/messages/seen",
    tag = "messages",
    request_body = MarkSeenRequest,
    responses(
        (status = 200, description = "Count of messages flipped to seen", body = SeenUpdateResponse)
    )
)]
pub async fn mark_messages_seen(
    State(state): State<AppState>,
    Json(payload): Json<MarkSeenRequest>,
) -> Result<impl IntoResponse> {
    let updated = state
        .message_service
        .update_message_seen(payload.sender, payload.receiver)
        .await?;

    Ok((StatusCode::OK, Json(SeenUpdateResponse { updated })))
}

/// Subscribe to new messages between two users via Server-Sent Events.
/// Both filter ids are required; leaving one out yields an empty stream.
#[utoipa::path(
    get,
    path = "/api/messages/stream",
    tag = "messages",
    params(
        ("auth_user_id" = Option<Uuid>, Query, description = "Requesting user ID"),
        ("user_id" = Option<Uuid>, Query, description = "Conversation partner ID")
    ),
    responses(
        (status = 200, description = "SSE stream of messages between the two users")
    )
)]
pub async fn message_stream(
    State(state): State<AppState>,
    Query(query): Query<MessageStreamQuery>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.events.subscribe_message_created();
    let auth_user_id = query.auth_user_id;
    let user_id = query.user_id;

    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(message) if events::message_matches_pair(&message, auth_user_id, user_id) => {
            let json = serde_json::to_string(&message).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Subscribe to conversation notifications addressed to a user via
/// Server-Sent Events.
#[utoipa::path(
    get,
    path = "/api/conversations/stream/{auth_user_id}",
    tag = "conversations",
    params(
        ("auth_user_id" = Uuid, Path, description = "Requesting user ID")
    ),
    responses(
        (status = 200, description = "SSE stream of conversation notifications")
    )
)]
pub async fn conversation_stream(
    State(state): State<AppState>,
    Path(auth_user_id): Path<Uuid>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.events.subscribe_new_conversation();

    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(notification) if notification.addressed_to(auth_user_id) => {
            let json = serde_json::to_string(&notification).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
