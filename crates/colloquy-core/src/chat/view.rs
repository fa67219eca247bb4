//! Caller-relative presentation of chats.
//!
//! A group chat shows its own title and image. A direct chat shows the name
//! and image of the *other* participant, so what a chat looks like depends on
//! who is asking. Nothing here touches storage.

use chrono::{DateTime, Utc};
use serde::Serialize;

use colloquy_types::chat::{Chat, Message};
use colloquy_types::error::ChatError;
use colloquy_types::id::{ChatId, UserId};
use colloquy_types::user::{Image, User};

/// The first participant that is not `caller`.
///
/// Fails with `NotFound` when the caller is the only participant or the
/// participant list is empty.
pub fn counterpart<'a>(chat: &'a Chat, caller: &UserId) -> Result<&'a User, ChatError> {
    chat.participants
        .iter()
        .find(|p| &p.id != caller)
        .ok_or_else(|| {
            ChatError::NotFound(format!(
                "no participant other than {caller} in chat {}",
                chat.id
            ))
        })
}

/// Title to show `caller` for this chat.
pub fn display_title<'a>(chat: &'a Chat, caller: &UserId) -> Result<&'a str, ChatError> {
    if chat.is_group_chat {
        return Ok(&chat.title);
    }
    Ok(&counterpart(chat, caller)?.name)
}

/// Image to show `caller` for this chat.
pub fn display_image<'a>(chat: &'a Chat, caller: &UserId) -> Result<&'a Image, ChatError> {
    if chat.is_group_chat {
        return Ok(&chat.image);
    }
    Ok(&counterpart(chat, caller)?.image)
}

pub fn is_participant(chat: &Chat, caller: &UserId) -> bool {
    chat.has_participant(caller)
}

/// Messages holding an unread receipt for `caller`.
pub fn unread_count(chat: &Chat, caller: &UserId) -> usize {
    chat.messages
        .iter()
        .filter(|m| m.read_state(caller) == Some(false))
        .count()
}

/// Chat projection with every caller-relative field computed.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub id: ChatId,
    pub title: String,
    pub display_title: String,
    pub display_image: Image,
    pub is_group_chat: bool,
    pub participant_count: usize,
    pub latest_message: Option<Message>,
    pub unread_count: usize,
    pub created_at: DateTime<Utc>,
}

impl ChatSummary {
    pub fn for_caller(chat: &Chat, caller: &UserId) -> Result<Self, ChatError> {
        Ok(Self {
            id: chat.id,
            title: chat.title.clone(),
            display_title: display_title(chat, caller)?.to_string(),
            display_image: display_image(chat, caller)?.clone(),
            is_group_chat: chat.is_group_chat,
            participant_count: chat.participants.len(),
            latest_message: chat.latest_message().cloned(),
            unread_count: unread_count(chat, caller),
            created_at: chat.created_at,
        })
    }
}
