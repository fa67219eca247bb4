//! SQLite user directory implementation.
//!
//! Implements `UserRepository` from `colloquy-core`. The row mapping here is
//! shared with the chat repository, which joins `users` to resolve every user
//! reference at read time.

use chrono::{DateTime, Utc};
use colloquy_core::user::repository::UserRepository;
use colloquy_types::error::RepositoryError;
use colloquy_types::id::UserId;
use colloquy_types::user::{Image, User};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Internal row type for a user, optionally read from prefixed join columns.
pub(crate) struct UserRow {
    id: String,
    username: String,
    name: String,
    image_thumbnail: String,
    image_original: String,
    created_at: String,
}

impl UserRow {
    /// Read `{prefix}id`, `{prefix}username`, ... from a row.
    ///
    /// Returns `Ok(None)` when `{prefix}id` is NULL (unmatched LEFT JOIN).
    pub(crate) fn from_prefixed(
        row: &sqlx::sqlite::SqliteRow,
        prefix: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let id: Option<String> = row.try_get(format!("{prefix}id").as_str())?;
        let Some(id) = id else {
            return Ok(None);
        };
        Ok(Some(Self {
            id,
            username: row.try_get(format!("{prefix}username").as_str())?,
            name: row.try_get(format!("{prefix}name").as_str())?,
            image_thumbnail: row.try_get(format!("{prefix}image_thumbnail").as_str())?,
            image_original: row.try_get(format!("{prefix}image_original").as_str())?,
            created_at: row.try_get(format!("{prefix}created_at").as_str())?,
        }))
    }

    pub(crate) fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: parse_id(&self.id, "user id")?,
            username: self.username,
            name: self.name,
            image: Image::new(self.image_thumbnail, self.image_original),
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Map an optional prefixed user on a row straight to a domain `User`.
pub(crate) fn user_from_row(
    row: &sqlx::sqlite::SqliteRow,
    prefix: &str,
) -> Result<Option<User>, RepositoryError> {
    UserRow::from_prefixed(row, prefix)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .map(UserRow::into_user)
        .transpose()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub(crate) fn parse_id<T>(s: &str, what: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    s.parse()
        .map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

pub(crate) fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

const USER_COLUMNS: &str = "id, username, name, image_thumbnail, image_original, created_at";

// ---------------------------------------------------------------------------
// UserRepository implementation
// ---------------------------------------------------------------------------

impl UserRepository for SqliteUserRepository {
    async fn upsert(&self, user: &User) -> Result<User, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO users (id, username, name, image_thumbnail, image_original, created_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   username = excluded.username,
                   name = excluded.name,
                   image_thumbnail = excluded.image_thumbnail,
                   image_original = excluded.image_original"#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.image.thumbnail)
        .bind(&user.image.original)
        .bind(format_datetime(&user.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!(
                        "username '{}' already exists",
                        user.username
                    ));
                }
            }
            query_err(e)
        })?;

        Ok(user.clone())
    }

    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => user_from_row(&row, ""),
            None => Ok(None),
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        match row {
            Some(row) => user_from_row(&row, ""),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username ASC"
        ))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(user) = user_from_row(row, "")? {
                users.push(user);
            }
        }
        Ok(users)
    }
}
