//! In-memory repositories and fixtures for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use colloquy_types::chat::{Chat, ChatRecord, Message, MessageRecord, ReadReceipt};
use colloquy_types::error::RepositoryError;
use colloquy_types::id::{ChatId, MessageId, UserId};
use colloquy_types::user::{Image, User};

use crate::chat::repository::ChatRepository;
use crate::user::repository::UserRepository;

pub fn user(name: &str) -> User {
    User {
        id: UserId::new(),
        username: name.to_lowercase(),
        name: name.to_string(),
        image: Image::default(),
        created_at: Utc::now(),
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

pub fn message_at(sender: &User, secs: i64) -> Message {
    Message {
        id: MessageId::new(),
        kind: Default::default(),
        sender: Some(sender.clone()),
        content: format!("sent at {secs}"),
        image: Image::default(),
        is_read_by: Vec::new(),
        created_at: at(secs),
    }
}

pub fn chat_with(title: &str, participants: &[&User], messages: Vec<Message>) -> Chat {
    Chat {
        id: ChatId::new(),
        title: title.to_string(),
        image: Image::new("placeholder-t.png", "placeholder-o.png"),
        description: String::new(),
        is_group_chat: false,
        admin: None,
        participants: participants.iter().map(|u| (*u).clone()).collect(),
        messages,
        created_at: Utc::now(),
    }
}

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    fn snapshot(&self) -> HashMap<UserId, User> {
        self.users.lock().unwrap().clone()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn upsert(&self, user: &User) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(RepositoryError::Conflict(user.username.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

struct StoredMessage {
    record: MessageRecord,
    receipts: Vec<(UserId, bool)>,
}

struct StoredChat {
    record: ChatRecord,
    messages: Vec<StoredMessage>,
}

/// Chat repository over a `Vec`, resolving users from a shared directory.
#[derive(Clone)]
pub struct InMemoryChatRepository {
    users: InMemoryUserRepository,
    chats: Arc<Mutex<Vec<StoredChat>>>,
}

impl InMemoryChatRepository {
    pub fn new(users: InMemoryUserRepository) -> Self {
        Self {
            users,
            chats: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

fn resolve_message(stored: &StoredMessage, users: &HashMap<UserId, User>) -> Message {
    Message {
        id: stored.record.id,
        kind: stored.record.kind,
        sender: stored.record.sender.and_then(|id| users.get(&id).cloned()),
        content: stored.record.content.clone(),
        image: stored.record.image.clone(),
        is_read_by: stored
            .receipts
            .iter()
            .filter_map(|(member, is_read)| {
                users.get(member).map(|u| ReadReceipt {
                    member: u.clone(),
                    is_read: *is_read,
                })
            })
            .collect(),
        created_at: stored.record.created_at,
    }
}

fn resolve(stored: &StoredChat, users: &HashMap<UserId, User>) -> Chat {
    let record = &stored.record;
    Chat {
        id: record.id,
        title: record.title.clone(),
        image: record.image.clone(),
        description: record.description.clone(),
        is_group_chat: record.is_group_chat,
        admin: record.admin.and_then(|id| users.get(&id).cloned()),
        participants: record
            .participants
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect(),
        messages: stored
            .messages
            .iter()
            .map(|m| resolve_message(m, users))
            .collect(),
        created_at: record.created_at,
    }
}

impl ChatRepository for InMemoryChatRepository {
    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.chats.lock().unwrap().len() as u64)
    }

    async fn list_all(&self) -> Result<Vec<Chat>, RepositoryError> {
        let users = self.users.snapshot();
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .map(|c| resolve(c, &users))
            .collect())
    }

    async fn get_by_id(&self, id: &ChatId) -> Result<Option<Chat>, RepositoryError> {
        let users = self.users.snapshot();
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| &c.record.id == id)
            .map(|c| resolve(c, &users)))
    }

    async fn find_by_participants(
        &self,
        participants: &[UserId],
    ) -> Result<Option<Chat>, RepositoryError> {
        let users = self.users.snapshot();
        let mut wanted = participants.to_vec();
        wanted.sort();
        wanted.dedup();
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| {
                let mut have = c.record.participants.clone();
                have.sort();
                have == wanted
            })
            .map(|c| resolve(c, &users)))
    }

    async fn list_by_participant(&self, user: &UserId) -> Result<Vec<Chat>, RepositoryError> {
        let users = self.users.snapshot();
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.record.participants.contains(user))
            .map(|c| resolve(c, &users))
            .collect())
    }

    async fn title_exists(&self, title: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.record.title == title))
    }

    async fn create_chat(&self, chat: &ChatRecord) -> Result<(), RepositoryError> {
        self.chats.lock().unwrap().push(StoredChat {
            record: chat.clone(),
            messages: Vec::new(),
        });
        Ok(())
    }

    async fn append_message(
        &self,
        chat_id: &ChatId,
        message: &MessageRecord,
    ) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        let chat = chats
            .iter_mut()
            .find(|c| &c.record.id == chat_id)
            .ok_or(RepositoryError::NotFound)?;
        chat.messages.push(StoredMessage {
            record: message.clone(),
            receipts: message.recipients.iter().map(|m| (*m, false)).collect(),
        });
        Ok(())
    }

    async fn get_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
    ) -> Result<Option<Message>, RepositoryError> {
        let users = self.users.snapshot();
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| &c.record.id == chat_id)
            .and_then(|c| c.messages.iter().find(|m| &m.record.id == message_id))
            .map(|m| resolve_message(m, &users)))
    }

    async fn mark_read(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        member: &UserId,
    ) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        let receipt = chats
            .iter_mut()
            .find(|c| &c.record.id == chat_id)
            .and_then(|c| c.messages.iter_mut().find(|m| &m.record.id == message_id))
            .and_then(|m| m.receipts.iter_mut().find(|(id, _)| id == member))
            .ok_or(RepositoryError::NotFound)?;
        receipt.1 = true;
        Ok(())
    }
}
