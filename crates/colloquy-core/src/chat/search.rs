//! Participant + title filtering and ordering for "list chats for a user".
//!
//! A chat matches when the caller is one of its participants and, if a title
//! filter is given, the title contains it as a case-insensitive substring.
//! The filter is literal text, never a pattern.
//!
//! Ordering follows [`ChatOrder`]. The default, `FirstMessage`, sorts by the
//! creation time of each chat's *first* message, newest first. That key does
//! not track recent activity; `LatestMessage` is available for that.
//! Chats without messages sort last, and ties keep their storage order.

use chrono::{DateTime, Utc};

use colloquy_types::chat::Chat;
use colloquy_types::config::ChatOrder;
use colloquy_types::id::UserId;

/// A compiled search for one caller.
#[derive(Debug, Clone)]
pub struct ChatSearch {
    caller: UserId,
    /// Lowercased title filter; `None` matches every title.
    needle: Option<String>,
    order: ChatOrder,
}

impl ChatSearch {
    /// An empty or missing filter matches all titles.
    pub fn new(caller: UserId, title_filter: Option<&str>) -> Self {
        let needle = title_filter
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);
        Self {
            caller,
            needle,
            order: ChatOrder::default(),
        }
    }

    pub fn with_order(mut self, order: ChatOrder) -> Self {
        self.order = order;
        self
    }

    pub fn matches(&self, chat: &Chat) -> bool {
        if !chat.has_participant(&self.caller) {
            return false;
        }
        match &self.needle {
            Some(needle) => chat.title.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }

    fn sort_key(&self, chat: &Chat) -> Option<DateTime<Utc>> {
        let message = match self.order {
            ChatOrder::FirstMessage => chat.first_message(),
            ChatOrder::LatestMessage => chat.latest_message(),
        };
        message.map(|m| m.created_at)
    }

    /// Filter `chats` and order the survivors.
    pub fn apply(&self, chats: Vec<Chat>) -> Vec<Chat> {
        let mut selected: Vec<Chat> = chats.into_iter().filter(|c| self.matches(c)).collect();
        // `None < Some(_)`, so reversing the comparison puts empty chats last.
        // sort_by is stable: equal keys keep storage order.
        selected.sort_by(|a, b| self.sort_key(b).cmp(&self.sort_key(a)));
        selected
    }
}
