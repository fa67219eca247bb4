//! Caller identity extractor.
//!
//! The caller is the user id in the `X-User-Id` header. A missing header
//! yields `Caller(None)`; operations that need a caller reject with
//! NOT_AUTHENTICATED. A malformed id is rejected up front with INVALID_ID.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use colloquy_core::chat::service::parse_user_id;
use colloquy_types::error::ChatError;
use colloquy_types::id::UserId;

use crate::http::error::AppError;

pub const CALLER_HEADER: &str = "x-user-id";

/// The acting user, if the request named one.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Option<UserId>);

impl Caller {
    /// The caller id, or NOT_AUTHENTICATED.
    pub fn require(&self) -> Result<UserId, AppError> {
        self.0.ok_or(AppError::Chat(ChatError::Unauthenticated))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(CALLER_HEADER) else {
            return Ok(Caller(None));
        };
        let raw = value
            .to_str()
            .map_err(|_| AppError::Validation("Invalid X-User-Id header encoding".to_string()))?;
        if raw.trim().is_empty() {
            return Ok(Caller(None));
        }
        Ok(Caller(Some(parse_user_id(raw)?)))
    }
}
