//! Chat service: the typed operation boundary of Colloquy.
//!
//! ChatService validates caller input, delegates to the `ChatRepository`,
//! applies the per-user search rule, and maps storage failures onto the
//! `ChatError` taxonomy. It holds no mutable state of its own; every request
//! is independent and all coordination happens in the store.

use chrono::Utc;
use tracing::{debug, info, warn};

use colloquy_types::chat::{Chat, ChatRecord, Message, MessageRecord, NewChat, NewMessage};
use colloquy_types::config::{ChatDefaults, ChatOrder, GlobalConfig};
use colloquy_types::error::{ChatError, RepositoryError};
use colloquy_types::id::{ChatId, MessageId, UserId};
use colloquy_types::user::Image;

use crate::chat::repository::ChatRepository;
use crate::chat::search::ChatSearch;
use crate::chat::view;
use crate::user::repository::UserRepository;

/// Orchestrates chat queries, creation, and read-state updates.
///
/// Generic over `ChatRepository` and `UserRepository` to maintain clean
/// architecture (colloquy-core never depends on colloquy-infra).
pub struct ChatService<C: ChatRepository, U: UserRepository> {
    chat_repo: C,
    user_repo: U,
    defaults: ChatDefaults,
    order: ChatOrder,
}

impl<C: ChatRepository, U: UserRepository> ChatService<C, U> {
    pub fn new(chat_repo: C, user_repo: U, config: &GlobalConfig) -> Self {
        Self {
            chat_repo,
            user_repo,
            defaults: config.chat_defaults.clone(),
            order: config.search.order,
        }
    }

    // --- Queries ---

    pub async fn count_chats(&self) -> Result<u64, ChatError> {
        self.chat_repo.count().await.map_err(storage)
    }

    /// Every chat, fully resolved, in storage order.
    pub async fn list_all_chats(&self) -> Result<Vec<Chat>, ChatError> {
        self.chat_repo.list_all().await.map_err(storage)
    }

    /// Get a chat by its textual id.
    ///
    /// A malformed id is an `InvalidArgument`; a well-formed id that is not
    /// assigned yields `Ok(None)`.
    pub async fn get_chat_by_id(&self, raw_id: &str) -> Result<Option<Chat>, ChatError> {
        let id = parse_chat_id(raw_id)?;
        self.get_chat(&id).await
    }

    pub async fn get_chat(&self, id: &ChatId) -> Result<Option<Chat>, ChatError> {
        self.chat_repo.get_by_id(id).await.map_err(storage)
    }

    /// Find the chat whose participant set is exactly `participants`.
    pub async fn find_chat_by_participants(
        &self,
        participants: &[UserId],
    ) -> Result<Option<Chat>, ChatError> {
        let wanted = dedup(participants);
        if wanted.is_empty() {
            return Ok(None);
        }
        self.chat_repo
            .find_by_participants(&wanted)
            .await
            .map_err(storage)
    }

    /// Chats the caller participates in, filtered by title and ordered.
    ///
    /// Requires a known caller.
    pub async fn list_chats_for_user(
        &self,
        caller: Option<&UserId>,
        title_filter: Option<&str>,
    ) -> Result<Vec<Chat>, ChatError> {
        let caller = caller.ok_or(ChatError::Unauthenticated)?;
        let search = ChatSearch::new(*caller, title_filter).with_order(self.order);

        let candidates = self
            .chat_repo
            .list_by_participant(caller)
            .await
            .map_err(storage)?;
        let chats = search.apply(candidates);

        debug!(caller = %caller, count = chats.len(), "Listed chats for user");
        Ok(chats)
    }

    pub async fn chat_title_exists(&self, title: &str) -> Result<bool, ChatError> {
        self.chat_repo.title_exists(title).await.map_err(storage)
    }

    /// Title to show `caller` for `chat`.
    pub fn display_title<'a>(&self, chat: &'a Chat, caller: &UserId) -> Result<&'a str, ChatError> {
        view::display_title(chat, caller)
    }

    /// Image to show `caller` for `chat`.
    pub fn display_image<'a>(
        &self,
        chat: &'a Chat,
        caller: &UserId,
    ) -> Result<&'a Image, ChatError> {
        view::display_image(chat, caller)
    }

    // --- Mutations ---

    /// Mark `member`'s receipt on a message as read. Idempotent.
    pub async fn mark_message_read(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        member: &UserId,
    ) -> Result<(), ChatError> {
        self.chat_repo
            .mark_read(chat_id, message_id, member)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ChatError::NotFound(format!(
                    "read receipt for member {member} on message {message_id} in chat {chat_id}"
                )),
                other => storage(other),
            })?;
        debug!(chat_id = %chat_id, message_id = %message_id, member = %member, "Message marked read");
        Ok(())
    }

    /// Create a chat.
    ///
    /// Duplicate participants are collapsed. A direct (non-group) chat needs
    /// exactly two distinct participants. Every referenced user must exist.
    pub async fn create_chat(&self, request: NewChat) -> Result<Chat, ChatError> {
        if request.title.trim().is_empty() {
            return Err(ChatError::validation("title", "must not be blank"));
        }

        let participants = dedup(&request.participants);
        if participants.is_empty() {
            return Err(ChatError::validation("participants", "must not be empty"));
        }
        if !request.is_group_chat && participants.len() != 2 {
            return Err(ChatError::validation(
                "participants",
                format!("direct chat needs 2 participants, got {}", participants.len()),
            ));
        }

        for id in participants.iter().chain(request.admin.iter()) {
            self.ensure_user_exists(id).await?;
        }

        let record = ChatRecord {
            id: ChatId::new(),
            title: request.title,
            image: request
                .image
                .unwrap_or_else(|| self.defaults.placeholder_image.clone()),
            description: request.description.unwrap_or_default(),
            is_group_chat: request.is_group_chat,
            admin: request.admin,
            participants,
            created_at: Utc::now(),
        };

        self.chat_repo
            .create_chat(&record)
            .await
            .map_err(storage)?;
        info!(chat_id = %record.id, title = %record.title, group = record.is_group_chat, "Chat created");

        self.get_chat(&record.id).await?.ok_or_else(|| {
            warn!(chat_id = %record.id, "Chat vanished right after creation");
            ChatError::NotFound(format!("chat {}", record.id))
        })
    }

    /// Append a message to a chat.
    ///
    /// Without explicit recipients, every participant other than the sender
    /// gets an unread receipt. The sender and any explicit recipients must be
    /// participants of the chat.
    pub async fn post_message(
        &self,
        chat_id: &ChatId,
        request: NewMessage,
    ) -> Result<Message, ChatError> {
        if request.content.is_empty() {
            return Err(ChatError::validation("content", "must not be empty"));
        }

        let chat = self
            .get_chat(chat_id)
            .await?
            .ok_or_else(|| ChatError::NotFound(format!("chat {chat_id}")))?;

        if let Some(sender) = &request.sender {
            if !chat.has_participant(sender) {
                return Err(ChatError::validation(
                    "sender",
                    format!("{sender} is not a participant"),
                ));
            }
        }

        let recipients = match &request.recipients {
            Some(explicit) => {
                let recipients = dedup(explicit);
                if let Some(outsider) = recipients.iter().find(|r| !chat.has_participant(r)) {
                    return Err(ChatError::validation(
                        "recipient",
                        format!("{outsider} is not a participant"),
                    ));
                }
                recipients
            }
            None => chat
                .participant_ids()
                .into_iter()
                .filter(|id| Some(id) != request.sender.as_ref())
                .collect(),
        };

        let record = MessageRecord {
            id: MessageId::new(),
            kind: request.kind,
            sender: request.sender,
            content: request.content,
            image: request.image.unwrap_or_default(),
            recipients,
            created_at: Utc::now(),
        };

        self.chat_repo
            .append_message(chat_id, &record)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ChatError::NotFound(format!("chat {chat_id}")),
                other => storage(other),
            })?;
        debug!(chat_id = %chat_id, message_id = %record.id, receipts = record.recipients.len(), "Message posted");

        self.chat_repo
            .get_message(chat_id, &record.id)
            .await
            .map_err(storage)?
            .ok_or_else(|| ChatError::NotFound(format!("message {} in chat {chat_id}", record.id)))
    }

    async fn ensure_user_exists(&self, id: &UserId) -> Result<(), ChatError> {
        match self.user_repo.get_by_id(id).await.map_err(storage)? {
            Some(_) => Ok(()),
            None => Err(ChatError::NotFound(format!("user {id}"))),
        }
    }
}

/// Parse a chat id, reporting the raw input on failure.
pub fn parse_chat_id(raw: &str) -> Result<ChatId, ChatError> {
    raw.parse().map_err(|_| ChatError::invalid("chat id", raw))
}

/// Parse a message id, reporting the raw input on failure.
pub fn parse_message_id(raw: &str) -> Result<MessageId, ChatError> {
    raw.parse().map_err(|_| ChatError::invalid("message id", raw))
}

/// Parse a user id, reporting the raw input on failure.
pub fn parse_user_id(raw: &str) -> Result<UserId, ChatError> {
    raw.parse().map_err(|_| ChatError::invalid("user id", raw))
}

/// Remove repeated ids, keeping first occurrence order.
fn dedup(ids: &[UserId]) -> Vec<UserId> {
    let mut out: Vec<UserId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

fn storage(e: RepositoryError) -> ChatError {
    ChatError::StorageError(e.to_string())
}
