use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    state::AppState,
    user::{user_dto::UpdatePresenceRequest, user_models::UserResponse},
};

/// Get a user's profile
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok((StatusCode::OK, Json(UserResponse::from(user))))
}

/// Set a user's online flag
#[utoipa::path(
    patch,
    path = "/api/users/{id}/presence",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdatePresenceRequest,
    responses(
        (status = 200, description = "Presence updated", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_presence(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdatePresenceRequest>,
) -> Result<impl IntoResponse> {
    let user = state
        .user_repository
        .set_online(user_id, payload.is_online)
        .await?;

    Ok((StatusCode::OK, Json(UserResponse::from(user))))
}
