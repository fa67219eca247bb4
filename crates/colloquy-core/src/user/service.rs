//! User directory service.
//!
//! Chats only reference users; this service keeps the directory those
//! references resolve against.

use chrono::Utc;
use tracing::info;

use colloquy_types::error::{ChatError, RepositoryError};
use colloquy_types::id::UserId;
use colloquy_types::user::{Image, User};

use crate::user::repository::UserRepository;

pub struct UserService<U: UserRepository> {
    user_repo: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(user_repo: U) -> Self {
        Self { user_repo }
    }

    /// Register a user, or refresh name and image if the username is taken.
    pub async fn register_user(
        &self,
        username: &str,
        name: &str,
        image: Option<Image>,
    ) -> Result<User, ChatError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ChatError::validation("username", "must not be blank"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::validation("name", "must not be blank"));
        }

        let existing = self
            .user_repo
            .get_by_username(username)
            .await
            .map_err(storage)?;

        let user = match existing {
            Some(mut user) => {
                user.name = name.to_string();
                if let Some(image) = image {
                    user.image = image;
                }
                user
            }
            None => User {
                id: UserId::new(),
                username: username.to_string(),
                name: name.to_string(),
                image: image.unwrap_or_default(),
                created_at: Utc::now(),
            },
        };

        let user = self.user_repo.upsert(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                ChatError::validation("username", format!("'{username}' is already taken"))
            }
            other => storage(other),
        })?;
        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<Option<User>, ChatError> {
        self.user_repo.get_by_id(id).await.map_err(storage)
    }

    /// Look up a user by id string or username.
    pub async fn resolve_user(&self, id_or_username: &str) -> Result<User, ChatError> {
        let found = match id_or_username.parse::<UserId>() {
            Ok(id) => self.user_repo.get_by_id(&id).await.map_err(storage)?,
            Err(_) => self
                .user_repo
                .get_by_username(id_or_username)
                .await
                .map_err(storage)?,
        };
        found.ok_or_else(|| ChatError::NotFound(format!("user {id_or_username}")))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ChatError> {
        self.user_repo.list().await.map_err(storage)
    }
}

fn storage(e: RepositoryError) -> ChatError {
    ChatError::StorageError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryUserRepository;

    #[tokio::test]
    async fn test_register_and_resolve() {
        let service = UserService::new(InMemoryUserRepository::default());
        let ada = service.register_user("ada", "Ada", None).await.unwrap();

        let by_name = service.resolve_user("ada").await.unwrap();
        assert_eq!(by_name.id, ada.id);
        let by_id = service.resolve_user(&ada.id.to_string()).await.unwrap();
        assert_eq!(by_id.username, "ada");

        assert!(matches!(
            service.resolve_user("nobody").await,
            Err(ChatError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_register_existing_username_updates_in_place() {
        let service = UserService::new(InMemoryUserRepository::default());
        let first = service.register_user("ada", "Ada", None).await.unwrap();
        let second = service
            .register_user("ada", "Ada Lovelace", Some(Image::new("t", "o")))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Ada Lovelace");
        assert_eq!(service.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields() {
        let service = UserService::new(InMemoryUserRepository::default());
        let err = service.register_user("  ", "Ada", None).await.unwrap_err();
        assert!(matches!(err, ChatError::Validation { field: "username", .. }));
        let err = service.register_user("ada", "", None).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
