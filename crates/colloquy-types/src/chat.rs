//! Chat, message, and read-receipt types for Colloquy.
//!
//! Two shapes exist for each entity:
//! - the *record* form (`ChatRecord`, `MessageRecord`) holds user references
//!   as `UserId`s and is what gets written to storage;
//! - the *resolved* form (`Chat`, `Message`, `ReadReceipt`) has every user
//!   reference replaced by a snapshot of that user, and is what reads return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::id::{ChatId, MessageId, UserId};
use crate::user::{Image, User};

/// Kind of a chat message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (kind IN ('notification', 'message', 'singleEmoji'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    Notification,
    #[default]
    Message,
    SingleEmoji,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Notification => write!(f, "notification"),
            MessageKind::Message => write!(f, "message"),
            MessageKind::SingleEmoji => write!(f, "singleEmoji"),
        }
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notification" => Ok(MessageKind::Notification),
            "message" => Ok(MessageKind::Message),
            "singleEmoji" | "single_emoji" => Ok(MessageKind::SingleEmoji),
            other => Err(format!("invalid message kind: '{other}'")),
        }
    }
}

/// One participant's read state for a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub member: User,
    pub is_read: bool,
}

/// A message embedded in a chat, with user references resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// `None` when the message has no sender or the sender no longer exists.
    pub sender: Option<User>,
    pub content: String,
    pub image: Image,
    /// One entry per member expected to read the message, in insertion order.
    pub is_read_by: Vec<ReadReceipt>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Read state of `member`, or `None` when the member has no receipt.
    pub fn read_state(&self, member: &UserId) -> Option<bool> {
        self.is_read_by
            .iter()
            .find(|r| &r.member.id == member)
            .map(|r| r.is_read)
    }
}

/// A chat with every user reference resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    pub image: Image,
    pub description: String,
    pub is_group_chat: bool,
    pub admin: Option<User>,
    /// Participants in insertion order.
    pub participants: Vec<User>,
    /// Messages in append order.
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn first_message(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn latest_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn has_participant(&self, user: &UserId) -> bool {
        self.participants.iter().any(|p| &p.id == user)
    }

    pub fn participant_ids(&self) -> Vec<UserId> {
        self.participants.iter().map(|p| p.id).collect()
    }
}

/// Storage form of a chat, as written by `create_chat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    pub id: ChatId,
    pub title: String,
    pub image: Image,
    pub description: String,
    pub is_group_chat: bool,
    pub admin: Option<UserId>,
    pub participants: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Storage form of a message, as written by `append_message`.
///
/// `recipients` become unread receipts, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: MessageId,
    pub kind: MessageKind,
    pub sender: Option<UserId>,
    pub content: String,
    pub image: Image,
    pub recipients: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a new chat. Only `title` and `participants` are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewChat {
    pub title: String,
    #[serde(default)]
    pub participants: Vec<UserId>,
    #[serde(default)]
    pub is_group_chat: bool,
    pub admin: Option<UserId>,
    pub description: Option<String>,
    /// Falls back to the configured placeholder image.
    pub image: Option<Image>,
}

/// Request to append a message to a chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMessage {
    pub content: String,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    pub sender: Option<UserId>,
    pub image: Option<Image>,
    /// Members expected to read the message. When omitted, every participant
    /// other than the sender gets an unread receipt.
    pub recipients: Option<Vec<UserId>>,
}
