//! ChatRepository trait definition.
//!
//! The logical storage contract for chats and their embedded messages.
//! Every read returns fully resolved entities: admin, participants, message
//! senders, and read-receipt members are snapshots of the referenced users at
//! read time.

use colloquy_types::chat::{Chat, ChatRecord, Message, MessageRecord};
use colloquy_types::error::RepositoryError;
use colloquy_types::id::{ChatId, MessageId, UserId};

/// Repository trait for chat and message persistence.
///
/// Implementations live in colloquy-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Total number of chats.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// All chats in storage order.
    fn list_all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    /// Get a chat by its unique ID.
    fn get_by_id(
        &self,
        id: &ChatId,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// Find a chat whose participant set equals `participants` (order-insensitive).
    fn find_by_participants(
        &self,
        participants: &[UserId],
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// All chats that `user` participates in, in storage order.
    fn list_by_participant(
        &self,
        user: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    /// True if any chat has exactly this title.
    fn title_exists(
        &self,
        title: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Persist a new chat with its participants.
    fn create_chat(
        &self,
        chat: &ChatRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a message (and one unread receipt per recipient) to a chat.
    ///
    /// Returns `RepositoryError::NotFound` if the chat does not exist.
    fn append_message(
        &self,
        chat_id: &ChatId,
        message: &MessageRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a single resolved message of a chat.
    fn get_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Set `is_read = true` on the `(message, member)` receipt.
    ///
    /// Must be atomic per receipt. Returns `RepositoryError::NotFound` when the
    /// chat, the message (within that chat), or the member's receipt is absent.
    fn mark_read(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        member: &UserId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
