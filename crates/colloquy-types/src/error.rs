use thiserror::Error;

/// Errors surfaced by chat operations.
///
/// Every variant carries a stable machine-readable code (see [`ChatError::code`])
/// and enough context (the offending id) to log and retry.
#[derive(Debug, Error)]
pub enum ChatError {
    /// A malformed identifier.
    #[error("invalid {field}: '{value}'")]
    InvalidArgument { field: &'static str, value: String },

    /// Well-formed input that breaks a chat or directory rule.
    #[error("{field} {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not logged in")]
    Unauthenticated,

    #[error("storage error: {0}")]
    StorageError(String),
}

impl ChatError {
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        ChatError::InvalidArgument {
            field,
            value: value.into(),
        }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ChatError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Stable error code for transports.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::InvalidArgument { .. } => "INVALID_ID",
            ChatError::Validation { .. } => "VALIDATION_ERROR",
            ChatError::NotFound(_) => "NOT_FOUND",
            ChatError::Unauthenticated => "NOT_AUTHENTICATED",
            ChatError::StorageError(_) => "STORAGE_ERROR",
        }
    }
}

/// Errors from repository operations (used by trait definitions in colloquy-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
