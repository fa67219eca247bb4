//! User directory handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use colloquy_types::user::{Image, User};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Body for `POST /api/v1/users`.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<Image>,
}

/// POST /api/v1/users - Register a user or refresh an existing username.
pub async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserRequest>,
) -> Result<ApiResponse<User>, AppError> {
    let start = Instant::now();
    let user = state
        .user_service
        .register_user(&body.username, &body.name, body.image)
        .await?;
    let link = format!("/api/v1/users/{}", user.id);
    Ok(ApiResponse::timed(user, start).with_link("self", &link))
}

/// GET /api/v1/users
pub async fn list_users(State(state): State<AppState>) -> Result<ApiResponse<Vec<User>>, AppError> {
    let start = Instant::now();
    let users = state.user_service.list_users().await?;
    Ok(ApiResponse::timed(users, start))
}

/// GET /api/v1/users/{id} - Look up by id or username.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id_or_username): Path<String>,
) -> Result<ApiResponse<User>, AppError> {
    let start = Instant::now();
    let user = state.user_service.resolve_user(&id_or_username).await?;
    Ok(ApiResponse::timed(user, start))
}
