//! User and image types.
//!
//! Users are owned by an external directory; chats only reference them by id
//! and resolve them to a snapshot of their current data on every read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// A pair of image URLs. Absence is represented by empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub thumbnail: String,
    pub original: String,
}

impl Image {
    pub fn new(thumbnail: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            thumbnail: thumbnail.into(),
            original: original.into(),
        }
    }
}

/// A user as seen by the chat layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique login handle.
    pub username: String,
    /// Display name shown as the title of direct chats.
    pub name: String,
    /// Profile image shown as the image of direct chats.
    #[serde(default)]
    pub image: Image,
    pub created_at: DateTime<Utc>,
}
