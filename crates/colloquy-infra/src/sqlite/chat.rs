//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `colloquy-core` using sqlx with split
//! read/write pools. Chats are hydrated in three steps (participants,
//! messages with senders, receipts with members) inside one read
//! transaction, each joined against `users` so every reference is a
//! snapshot of the user at read time.
//! References to users that no longer exist drop out of participant and
//! receipt lists and resolve to `None` for admin and sender.

use colloquy_core::chat::repository::ChatRepository;
use colloquy_types::chat::{Chat, ChatRecord, Message, MessageKind, MessageRecord, ReadReceipt};
use colloquy_types::error::RepositoryError;
use colloquy_types::id::{ChatId, MessageId, UserId};
use colloquy_types::user::Image;
use sqlx::{Row, SqliteConnection};

use super::pool::DatabasePool;
use super::user::{format_datetime, parse_datetime, parse_id, query_err, user_from_row};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

const CHAT_SELECT: &str = r#"
    SELECT c.id, c.title, c.image_thumbnail, c.image_original, c.description,
           c.is_group_chat, c.created_at,
           a.id AS admin_id, a.username AS admin_username, a.name AS admin_name,
           a.image_thumbnail AS admin_image_thumbnail,
           a.image_original AS admin_image_original,
           a.created_at AS admin_created_at
    FROM chats c
    LEFT JOIN users a ON a.id = c.admin_id"#;

const PARTICIPANTS_SELECT: &str = r#"
    SELECT u.id, u.username, u.name, u.image_thumbnail, u.image_original, u.created_at
    FROM chat_participants cp
    JOIN users u ON u.id = cp.user_id
    WHERE cp.chat_id = ?
    ORDER BY cp.position ASC"#;

const MESSAGE_SELECT: &str = r#"
    SELECT m.id, m.kind, m.content, m.image_thumbnail, m.image_original, m.created_at,
           s.id AS sender_id, s.username AS sender_username, s.name AS sender_name,
           s.image_thumbnail AS sender_image_thumbnail,
           s.image_original AS sender_image_original,
           s.created_at AS sender_created_at
    FROM chat_messages m
    LEFT JOIN users s ON s.id = m.sender_id"#;

const RECEIPTS_SELECT: &str = r#"
    SELECT r.message_id, r.is_read,
           u.id AS member_id, u.username AS member_username, u.name AS member_name,
           u.image_thumbnail AS member_image_thumbnail,
           u.image_original AS member_image_original,
           u.created_at AS member_created_at
    FROM message_reads r
    JOIN chat_messages m ON m.id = r.message_id
    JOIN users u ON u.id = r.member_id"#;

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for a chat header (everything but participants and messages).
struct ChatRow {
    id: String,
    title: String,
    image_thumbnail: String,
    image_original: String,
    description: String,
    is_group_chat: bool,
    created_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            image_thumbnail: row.try_get("image_thumbnail")?,
            image_original: row.try_get("image_original")?,
            description: row.try_get("description")?,
            is_group_chat: row.try_get("is_group_chat")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Build a chat shell; participants and messages are filled in by `hydrate`.
    fn into_chat(self) -> Result<Chat, RepositoryError> {
        Ok(Chat {
            id: parse_id(&self.id, "chat id")?,
            title: self.title,
            image: Image::new(self.image_thumbnail, self.image_original),
            description: self.description,
            is_group_chat: self.is_group_chat,
            admin: None,
            participants: Vec::new(),
            messages: Vec::new(),
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Internal row type for a message without receipts.
struct MessageRow {
    id: String,
    kind: String,
    content: String,
    image_thumbnail: String,
    image_original: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            kind: row.try_get("kind")?,
            content: row.try_get("content")?,
            image_thumbnail: row.try_get("image_thumbnail")?,
            image_original: row.try_get("image_original")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let kind: MessageKind = self
            .kind
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Message {
            id: parse_id(&self.id, "message id")?,
            kind,
            sender: None,
            content: self.content,
            image: Image::new(self.image_thumbnail, self.image_original),
            is_read_by: Vec::new(),
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Message, RepositoryError> {
    let mut message = MessageRow::from_row(row)
        .map_err(query_err)?
        .into_message()?;
    message.sender = user_from_row(row, "sender_")?;
    Ok(message)
}

/// `?, ?, ?` with `n` placeholders.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

// ---------------------------------------------------------------------------
// Hydration
// ---------------------------------------------------------------------------

// All hydration queries for one call run on a single reader connection inside
// one read transaction, so a chat is assembled from one snapshot.

async fn load_participants(
    conn: &mut SqliteConnection,
    chat: &mut Chat,
) -> Result<(), RepositoryError> {
    let rows = sqlx::query(PARTICIPANTS_SELECT)
        .bind(chat.id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(query_err)?;

    chat.participants = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(user) = user_from_row(row, "")? {
            chat.participants.push(user);
        }
    }
    Ok(())
}

async fn load_messages(conn: &mut SqliteConnection, chat: &mut Chat) -> Result<(), RepositoryError> {
    let rows = sqlx::query(&format!(
        "{MESSAGE_SELECT} WHERE m.chat_id = ? ORDER BY m.position ASC"
    ))
    .bind(chat.id.to_string())
    .fetch_all(&mut *conn)
    .await
    .map_err(query_err)?;

    chat.messages = Vec::with_capacity(rows.len());
    for row in &rows {
        chat.messages.push(message_from_row(row)?);
    }

    let rows = sqlx::query(&format!(
        "{RECEIPTS_SELECT} WHERE m.chat_id = ? ORDER BY m.position ASC, r.position ASC"
    ))
    .bind(chat.id.to_string())
    .fetch_all(&mut *conn)
    .await
    .map_err(query_err)?;

    for row in &rows {
        let message_id: String = row.try_get("message_id").map_err(query_err)?;
        let (message_id, receipt) = receipt_from_row(row, &message_id)?;
        if let Some(message) = chat.messages.iter_mut().find(|m| m.id == message_id) {
            message.is_read_by.push(receipt);
        }
    }
    Ok(())
}

/// Resolve admin (already joined), participants, and messages for each row.
async fn hydrate(
    conn: &mut SqliteConnection,
    rows: &[sqlx::sqlite::SqliteRow],
) -> Result<Vec<Chat>, RepositoryError> {
    let mut chats = Vec::with_capacity(rows.len());
    for row in rows {
        let mut chat = ChatRow::from_row(row).map_err(query_err)?.into_chat()?;
        chat.admin = user_from_row(row, "admin_")?;
        load_participants(conn, &mut chat).await?;
        load_messages(conn, &mut chat).await?;
        chats.push(chat);
    }
    Ok(chats)
}

impl SqliteChatRepository {
    async fn fetch_chats(
        &self,
        sql: &str,
        binds: &[String],
    ) -> Result<Vec<Chat>, RepositoryError> {
        let mut tx = self.pool.reader.begin().await.map_err(query_err)?;

        let mut query = sqlx::query(sql);
        for value in binds {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&mut *tx).await.map_err(query_err)?;
        let chats = hydrate(&mut tx, &rows).await?;

        tx.commit().await.map_err(query_err)?;
        Ok(chats)
    }
}

fn receipt_from_row(
    row: &sqlx::sqlite::SqliteRow,
    message_id: &str,
) -> Result<(MessageId, ReadReceipt), RepositoryError> {
    let member = user_from_row(row, "member_")?
        .ok_or_else(|| RepositoryError::Query("receipt without member".to_string()))?;
    let is_read: bool = row.try_get("is_read").map_err(query_err)?;
    Ok((
        parse_id(message_id, "message id")?,
        ReadReceipt { member, is_read },
    ))
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn count(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM chats")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let count: i64 = row.try_get("cnt").map_err(query_err)?;
        Ok(count as u64)
    }

    async fn list_all(&self) -> Result<Vec<Chat>, RepositoryError> {
        self.fetch_chats(&format!("{CHAT_SELECT} ORDER BY c.rowid ASC"), &[])
            .await
    }

    async fn get_by_id(&self, id: &ChatId) -> Result<Option<Chat>, RepositoryError> {
        let chats = self
            .fetch_chats(&format!("{CHAT_SELECT} WHERE c.id = ?"), &[id.to_string()])
            .await?;
        Ok(chats.into_iter().next())
    }

    async fn find_by_participants(
        &self,
        participants: &[UserId],
    ) -> Result<Option<Chat>, RepositoryError> {
        let mut wanted: Vec<String> = participants.iter().map(|p| p.to_string()).collect();
        wanted.sort();
        wanted.dedup();
        if wanted.is_empty() {
            return Ok(None);
        }

        // Same size and every member in the wanted set means equal sets.
        let sql = format!(
            r#"SELECT cp.chat_id
               FROM chat_participants cp
               JOIN chats c ON c.id = cp.chat_id
               GROUP BY cp.chat_id
               HAVING COUNT(*) = ?
                  AND SUM(CASE WHEN cp.user_id IN ({}) THEN 1 ELSE 0 END) = ?
               ORDER BY MIN(c.rowid) ASC
               LIMIT 1"#,
            placeholders(wanted.len())
        );

        let mut query = sqlx::query(&sql).bind(wanted.len() as i64);
        for id in &wanted {
            query = query.bind(id);
        }
        let row = query
            .bind(wanted.len() as i64)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let chat_id: String = row.try_get("chat_id").map_err(query_err)?;
                self.get_by_id(&parse_id(&chat_id, "chat id")?).await
            }
            None => Ok(None),
        }
    }

    async fn list_by_participant(&self, user: &UserId) -> Result<Vec<Chat>, RepositoryError> {
        self.fetch_chats(
            &format!(
                "{CHAT_SELECT} WHERE c.id IN (SELECT chat_id FROM chat_participants WHERE user_id = ?) ORDER BY c.rowid ASC"
            ),
            &[user.to_string()],
        )
        .await
    }

    async fn title_exists(&self, title: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM chats WHERE title = ?) AS found")
            .bind(title)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let found: bool = row.try_get("found").map_err(query_err)?;
        Ok(found)
    }

    async fn create_chat(&self, chat: &ChatRecord) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query(
            r#"INSERT INTO chats (id, title, image_thumbnail, image_original, description, is_group_chat, admin_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(chat.id.to_string())
        .bind(&chat.title)
        .bind(&chat.image.thumbnail)
        .bind(&chat.image.original)
        .bind(&chat.description)
        .bind(chat.is_group_chat)
        .bind(chat.admin.map(|a| a.to_string()))
        .bind(format_datetime(&chat.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!("chat {} already exists", chat.id));
                }
            }
            query_err(e)
        })?;

        for (position, user_id) in chat.participants.iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO chat_participants (chat_id, user_id, position) VALUES (?, ?, ?)",
            )
            .bind(chat.id.to_string())
            .bind(user_id.to_string())
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn append_message(
        &self,
        chat_id: &ChatId,
        message: &MessageRecord,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let exists = sqlx::query("SELECT 1 FROM chats WHERE id = ?")
            .bind(chat_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_err)?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r#"INSERT INTO chat_messages (id, chat_id, kind, sender_id, content, image_thumbnail, image_original, position, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?,
                       (SELECT COALESCE(MAX(position), -1) + 1 FROM chat_messages WHERE chat_id = ?),
                       ?)"#,
        )
        .bind(message.id.to_string())
        .bind(chat_id.to_string())
        .bind(message.kind.to_string())
        .bind(message.sender.map(|s| s.to_string()))
        .bind(&message.content)
        .bind(&message.image.thumbnail)
        .bind(&message.image.original)
        .bind(chat_id.to_string())
        .bind(format_datetime(&message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        for (position, member) in message.recipients.iter().enumerate() {
            // A member appears at most once per message; repeats are ignored.
            sqlx::query(
                "INSERT OR IGNORE INTO message_reads (message_id, member_id, is_read, position) VALUES (?, ?, 0, ?)",
            )
            .bind(message.id.to_string())
            .bind(member.to_string())
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn get_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
    ) -> Result<Option<Message>, RepositoryError> {
        let mut tx = self.pool.reader.begin().await.map_err(query_err)?;

        let row = sqlx::query(&format!("{MESSAGE_SELECT} WHERE m.chat_id = ? AND m.id = ?"))
            .bind(chat_id.to_string())
            .bind(message_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut message = message_from_row(&row)?;

        let rows = sqlx::query(&format!(
            "{RECEIPTS_SELECT} WHERE r.message_id = ? ORDER BY r.position ASC"
        ))
        .bind(message_id.to_string())
        .fetch_all(&mut *tx)
        .await
        .map_err(query_err)?;
        tx.commit().await.map_err(query_err)?;

        let raw_id = message_id.to_string();
        for row in &rows {
            let (_, receipt) = receipt_from_row(row, &raw_id)?;
            message.is_read_by.push(receipt);
        }
        Ok(Some(message))
    }

    async fn mark_read(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        member: &UserId,
    ) -> Result<(), RepositoryError> {
        // Single statement: atomic per (message, member) row. SQLite counts a
        // matched row as changed even when is_read was already 1.
        let result = sqlx::query(
            r#"UPDATE message_reads SET is_read = 1
               WHERE member_id = ?
                 AND message_id = (SELECT id FROM chat_messages WHERE id = ? AND chat_id = ?)"#,
        )
        .bind(member.to_string())
        .bind(message_id.to_string())
        .bind(chat_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::{DatabasePool, database_url};
    use crate::sqlite::user::SqliteUserRepository;
    use chrono::Utc;
    use colloquy_core::user::repository::UserRepository;
    use colloquy_types::config::DatabaseConfig;
    use colloquy_types::user::User;
    use std::sync::Arc;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn add_user(pool: &DatabasePool, username: &str) -> User {
        let repo = SqliteUserRepository::new(pool.clone());
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            name: format!("{username} name"),
            image: Image::new(format!("{username}.t"), format!("{username}.o")),
            created_at: Utc::now(),
        };
        repo.upsert(&user).await.unwrap()
    }

    fn make_chat(title: &str, participants: &[&User], group: bool) -> ChatRecord {
        ChatRecord {
            id: ChatId::new(),
            title: title.to_string(),
            image: Image::new("placeholder.t", "placeholder.o"),
            description: String::new(),
            is_group_chat: group,
            admin: participants.first().map(|u| u.id),
            participants: participants.iter().map(|u| u.id).collect(),
            created_at: Utc::now(),
        }
    }

    fn make_message(sender: &User, content: &str, recipients: &[&User]) -> MessageRecord {
        MessageRecord {
            id: MessageId::new(),
            kind: MessageKind::Message,
            sender: Some(sender.id),
            content: content.to_string(),
            image: Image::default(),
            recipients: recipients.iter().map(|u| u.id).collect(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_resolved_chat() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let ada = add_user(&pool, "ada").await;
        let bob = add_user(&pool, "bob").await;

        let record = make_chat("Ada & Bob", &[&ada, &bob], false);
        repo.create_chat(&record).await.unwrap();
        let msg = make_message(&ada, "hello", &[&bob]);
        repo.append_message(&record.id, &msg).await.unwrap();

        let chat = repo.get_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(chat.title, "Ada & Bob");
        assert!(!chat.is_group_chat);
        assert_eq!(chat.admin.as_ref().unwrap().username, "ada");
        let names: Vec<&str> = chat.participants.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["ada", "bob"]);
        assert_eq!(chat.participants[1].image.original, "bob.o");

        assert_eq!(chat.messages.len(), 1);
        let message = &chat.messages[0];
        assert_eq!(message.content, "hello");
        assert_eq!(message.kind, MessageKind::Message);
        assert_eq!(message.sender.as_ref().unwrap().id, ada.id);
        assert_eq!(message.is_read_by.len(), 1);
        assert_eq!(message.is_read_by[0].member.id, bob.id);
        assert!(!message.is_read_by[0].is_read);
    }

    #[tokio::test]
    async fn test_resolution_is_a_snapshot_of_current_user_data() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let users = SqliteUserRepository::new(pool.clone());
        let mut ada = add_user(&pool, "ada").await;
        let bob = add_user(&pool, "bob").await;

        let record = make_chat("chat", &[&ada, &bob], false);
        repo.create_chat(&record).await.unwrap();

        ada.name = "Renamed".to_string();
        users.upsert(&ada).await.unwrap();

        let chat = repo.get_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(chat.participants[0].name, "Renamed");
    }

    #[tokio::test]
    async fn test_dangling_references() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let ada = add_user(&pool, "ada").await;
        let ghost = UserId::new();

        let mut record = make_chat("ghosts", &[&ada], true);
        record.participants.push(ghost);
        record.admin = Some(ghost);
        repo.create_chat(&record).await.unwrap();

        let chat = repo.get_by_id(&record.id).await.unwrap().unwrap();
        assert!(chat.admin.is_none());
        assert_eq!(chat.participants.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_chat_is_none() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        assert!(repo.get_by_id(&ChatId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_and_list_all_in_storage_order() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let ada = add_user(&pool, "ada").await;
        let bob = add_user(&pool, "bob").await;

        assert_eq!(repo.count().await.unwrap(), 0);
        for title in ["first", "second", "third"] {
            repo.create_chat(&make_chat(title, &[&ada, &bob], true))
                .await
                .unwrap();
        }
        assert_eq!(repo.count().await.unwrap(), 3);

        let titles: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_find_by_participants_uses_set_equality() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let ada = add_user(&pool, "ada").await;
        let bob = add_user(&pool, "bob").await;
        let cy = add_user(&pool, "cy").await;

        let trio = make_chat("trio", &[&ada, &bob, &cy], true);
        repo.create_chat(&trio).await.unwrap();
        let pair = make_chat("pair", &[&ada, &bob], false);
        repo.create_chat(&pair).await.unwrap();

        let found = repo
            .find_by_participants(&[bob.id, ada.id])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, pair.id);

        let found = repo
            .find_by_participants(&[cy.id, ada.id, bob.id, ada.id])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, trio.id);

        assert!(repo
            .find_by_participants(&[ada.id, cy.id])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_by_participant_and_title_exists() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let ada = add_user(&pool, "ada").await;
        let bob = add_user(&pool, "bob").await;
        let cy = add_user(&pool, "cy").await;

        repo.create_chat(&make_chat("ab", &[&ada, &bob], false))
            .await
            .unwrap();
        repo.create_chat(&make_chat("bc", &[&bob, &cy], false))
            .await
            .unwrap();

        let for_ada = repo.list_by_participant(&ada.id).await.unwrap();
        assert_eq!(for_ada.len(), 1);
        assert_eq!(for_ada[0].title, "ab");
        assert_eq!(repo.list_by_participant(&bob.id).await.unwrap().len(), 2);
        assert!(repo.list_by_participant(&UserId::new()).await.unwrap().is_empty());

        assert!(repo.title_exists("bc").await.unwrap());
        assert!(!repo.title_exists("BC").await.unwrap());
    }

    #[tokio::test]
    async fn test_messages_keep_append_order_and_unique_receipts() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let ada = add_user(&pool, "ada").await;
        let bob = add_user(&pool, "bob").await;
        let record = make_chat("chat", &[&ada, &bob], false);
        repo.create_chat(&record).await.unwrap();

        for content in ["one", "two", "three"] {
            repo.append_message(&record.id, &make_message(&ada, content, &[&bob, &bob]))
                .await
                .unwrap();
        }

        let chat = repo.get_by_id(&record.id).await.unwrap().unwrap();
        let contents: Vec<&str> = chat.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert!(chat.messages.iter().all(|m| m.is_read_by.len() == 1));
    }

    #[tokio::test]
    async fn test_append_to_missing_chat_is_not_found() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let ada = add_user(&pool, "ada").await;
        let err = repo
            .append_message(&ChatId::new(), &make_message(&ada, "x", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_mark_read_idempotent_and_scoped() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let ada = add_user(&pool, "ada").await;
        let bob = add_user(&pool, "bob").await;
        let cy = add_user(&pool, "cy").await;
        let record = make_chat("trio", &[&ada, &bob, &cy], true);
        repo.create_chat(&record).await.unwrap();
        let msg = make_message(&ada, "hi", &[&bob, &cy]);
        repo.append_message(&record.id, &msg).await.unwrap();

        repo.mark_read(&record.id, &msg.id, &bob.id).await.unwrap();
        let once = repo.get_message(&record.id, &msg.id).await.unwrap().unwrap();
        repo.mark_read(&record.id, &msg.id, &bob.id).await.unwrap();
        let twice = repo.get_message(&record.id, &msg.id).await.unwrap().unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.read_state(&bob.id), Some(true));
        assert_eq!(twice.read_state(&cy.id), Some(false));
    }

    #[tokio::test]
    async fn test_mark_read_not_found() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let ada = add_user(&pool, "ada").await;
        let bob = add_user(&pool, "bob").await;
        let record = make_chat("pair", &[&ada, &bob], false);
        repo.create_chat(&record).await.unwrap();
        let other = make_chat("other", &[&ada, &bob], true);
        repo.create_chat(&other).await.unwrap();
        let msg = make_message(&ada, "hi", &[&bob]);
        repo.append_message(&record.id, &msg).await.unwrap();

        // Member without a receipt.
        assert!(matches!(
            repo.mark_read(&record.id, &msg.id, &ada.id).await,
            Err(RepositoryError::NotFound)
        ));
        // Message belongs to a different chat.
        assert!(matches!(
            repo.mark_read(&other.id, &msg.id, &bob.id).await,
            Err(RepositoryError::NotFound)
        ));
        // Unknown message.
        assert!(matches!(
            repo.mark_read(&record.id, &MessageId::new(), &bob.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_receipts_are_not_lost() {
        let pool = test_pool().await;
        let repo = Arc::new(SqliteChatRepository::new(pool.clone()));
        let ada = add_user(&pool, "ada").await;
        let mut members = Vec::new();
        for i in 0..8 {
            members.push(add_user(&pool, &format!("member{i}")).await);
        }

        let mut everyone: Vec<&User> = vec![&ada];
        everyone.extend(members.iter());
        let record = make_chat("crowd", &everyone, true);
        repo.create_chat(&record).await.unwrap();
        let recipients: Vec<&User> = members.iter().collect();
        let msg = make_message(&ada, "read me", &recipients);
        repo.append_message(&record.id, &msg).await.unwrap();

        let mut handles = Vec::new();
        for member in &members {
            let repo = Arc::clone(&repo);
            let (chat_id, message_id, member_id) = (record.id, msg.id, member.id);
            handles.push(tokio::spawn(async move {
                repo.mark_read(&chat_id, &message_id, &member_id).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let message = repo.get_message(&record.id, &msg.id).await.unwrap().unwrap();
        assert_eq!(message.is_read_by.len(), members.len());
        assert!(message.is_read_by.iter().all(|r| r.is_read));
    }

    #[tokio::test]
    async fn test_hydration_on_single_reader_under_concurrent_appends() {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path());
        std::mem::forget(dir);
        let config = DatabaseConfig {
            reader_connections: 1,
            ..DatabaseConfig::default()
        };
        let pool = DatabasePool::with_config(&url, &config).await.unwrap();
        let repo = Arc::new(SqliteChatRepository::new(pool.clone()));
        let ada = add_user(&pool, "ada").await;
        let bob = add_user(&pool, "bob").await;
        let record = make_chat("busy", &[&ada, &bob], false);
        repo.create_chat(&record).await.unwrap();

        let writer = {
            let repo = Arc::clone(&repo);
            let (ada, bob, chat_id) = (ada.clone(), bob.clone(), record.id);
            tokio::spawn(async move {
                for i in 0..20 {
                    let msg = make_message(&ada, &format!("m{i}"), &[&bob]);
                    repo.append_message(&chat_id, &msg).await.unwrap();
                }
            })
        };

        for _ in 0..20 {
            let chats = tokio::time::timeout(
                std::time::Duration::from_secs(5),
                repo.list_by_participant(&bob.id),
            )
            .await
            .expect("hydration must not wait on a second reader connection")
            .unwrap();
            assert_eq!(chats.len(), 1);
            for (i, message) in chats[0].messages.iter().enumerate() {
                assert_eq!(message.content, format!("m{i}"));
                assert_eq!(message.is_read_by.len(), 1);
            }
        }
        writer.await.unwrap();

        let chat = repo.get_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(chat.messages.len(), 20);
    }
}
