//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use colloquy_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat store, view, or directory errors.
    Chat(ChatError),
    /// Malformed request outside the domain types (bad header, bad query).
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Chat(ChatError::InvalidArgument { .. })
            | AppError::Chat(ChatError::Validation { .. }) => StatusCode::BAD_REQUEST,
            AppError::Chat(ChatError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            AppError::Chat(ChatError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Chat(ChatError::StorageError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Chat(e) => e.code(),
            AppError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match &self {
            AppError::Chat(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        };

        if status.is_server_error() {
            tracing::error!(code, %message, "Request failed");
        } else {
            tracing::debug!(code, %message, status = status.as_u16(), "Request rejected");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": uuid::Uuid::now_v7().to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
