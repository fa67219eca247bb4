//! Chat handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};

use colloquy_core::chat::service::{parse_chat_id, parse_message_id, parse_user_id};
use colloquy_core::chat::view::{self, ChatSummary};
use colloquy_types::chat::{Chat, Message, NewChat, NewMessage};
use colloquy_types::error::ChatError;

use crate::http::error::AppError;
use crate::http::extractors::caller::Caller;
use crate::http::extractors::query::{ParticipantsQuery, TitleQuery};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/chats - The caller's chats, filtered by `?title=` and ordered by message time.
pub async fn list_my_chats(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<TitleQuery>,
) -> Result<ApiResponse<Vec<Chat>>, AppError> {
    let start = Instant::now();
    let chats = state
        .chat_service
        .list_chats_for_user(caller.0.as_ref(), query.title.as_deref())
        .await?;

    Ok(ApiResponse::timed(chats, start).with_link("self", "/api/v1/chats"))
}

/// GET /api/v1/chats/summaries - Caller-relative summaries of the caller's chats.
pub async fn list_my_summaries(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<TitleQuery>,
) -> Result<ApiResponse<Vec<ChatSummary>>, AppError> {
    let start = Instant::now();
    let chats = state
        .chat_service
        .list_chats_for_user(caller.0.as_ref(), query.title.as_deref())
        .await?;
    let caller_id = caller.require()?;

    let mut summaries = Vec::with_capacity(chats.len());
    for chat in &chats {
        match ChatSummary::for_caller(chat, &caller_id) {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                tracing::warn!(chat_id = %chat.id, error = %e, "Skipping chat without a displayable counterpart");
            }
        }
    }

    Ok(ApiResponse::timed(summaries, start))
}

/// GET /api/v1/chats/all - Every chat in storage order.
pub async fn list_all_chats(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Chat>>, AppError> {
    let start = Instant::now();
    let chats = state.chat_service.list_all_chats().await?;
    Ok(ApiResponse::timed(chats, start))
}

/// GET /api/v1/chats/count
pub async fn count_chats(
    State(state): State<AppState>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let count = state.chat_service.count_chats().await?;
    Ok(ApiResponse::timed(serde_json::json!({ "count": count }), start))
}

/// GET /api/v1/chats/exists?title= - Exact title match.
pub async fn title_exists(
    State(state): State<AppState>,
    Query(query): Query<TitleQuery>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let title = query
        .title
        .ok_or_else(|| AppError::Validation("Missing 'title' query parameter".to_string()))?;
    let exists = state.chat_service.chat_title_exists(&title).await?;
    Ok(ApiResponse::timed(
        serde_json::json!({ "title": title, "exists": exists }),
        start,
    ))
}

/// GET /api/v1/chats/find?participants=<id>,<id> - Chat with exactly these participants.
pub async fn find_by_participants(
    State(state): State<AppState>,
    Query(query): Query<ParticipantsQuery>,
) -> Result<ApiResponse<Option<Chat>>, AppError> {
    let start = Instant::now();
    let ids = query
        .entries()
        .map(parse_user_id)
        .collect::<Result<Vec<_>, _>>()?;
    let found = state.chat_service.find_chat_by_participants(&ids).await?;
    Ok(ApiResponse::timed(found, start))
}

/// POST /api/v1/chats - Create a chat. The admin defaults to the caller.
pub async fn create_chat(
    State(state): State<AppState>,
    caller: Caller,
    Json(mut body): Json<NewChat>,
) -> Result<ApiResponse<Chat>, AppError> {
    let start = Instant::now();
    if body.admin.is_none() {
        body.admin = caller.0;
    }
    let chat = state.chat_service.create_chat(body).await?;
    let link = format!("/api/v1/chats/{}", chat.id);
    Ok(ApiResponse::timed(chat, start).with_link("self", &link))
}

/// GET /api/v1/chats/{id}
pub async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Chat>, AppError> {
    let start = Instant::now();
    let chat = state
        .chat_service
        .get_chat_by_id(&id)
        .await?
        .ok_or_else(|| ChatError::NotFound(format!("chat {id}")))?;
    let messages = format!("/api/v1/chats/{}/messages", chat.id);
    Ok(ApiResponse::timed(chat, start).with_link("messages", &messages))
}

/// GET /api/v1/chats/{id}/view - Display title, image and unread count for the caller.
pub async fn view_chat(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<ApiResponse<ChatSummary>, AppError> {
    let start = Instant::now();
    let caller_id = caller.require()?;
    let chat = state
        .chat_service
        .get_chat_by_id(&id)
        .await?
        .ok_or_else(|| ChatError::NotFound(format!("chat {id}")))?;
    if !view::is_participant(&chat, &caller_id) {
        return Err(ChatError::NotFound(format!("chat {id} for user {caller_id}")).into());
    }
    let summary = ChatSummary::for_caller(&chat, &caller_id)?;
    Ok(ApiResponse::timed(summary, start))
}

/// POST /api/v1/chats/{id}/messages - Append a message. The sender defaults to the caller.
pub async fn post_message(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(mut body): Json<NewMessage>,
) -> Result<ApiResponse<Message>, AppError> {
    let start = Instant::now();
    let chat_id = parse_chat_id(&id)?;
    if body.sender.is_none() {
        body.sender = caller.0;
    }
    let message = state.chat_service.post_message(&chat_id, body).await?;
    Ok(ApiResponse::timed(message, start))
}

/// POST /api/v1/chats/{id}/messages/{message_id}/read - Mark read for the caller.
pub async fn mark_read(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, message_id)): Path<(String, String)>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let member = caller.require()?;
    let chat_id = parse_chat_id(&id)?;
    let message_id = parse_message_id(&message_id)?;

    state
        .chat_service
        .mark_message_read(&chat_id, &message_id, &member)
        .await?;

    Ok(ApiResponse::timed(
        serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "member": member,
            "is_read": true,
        }),
        start,
    ))
}
