//! UserRepository trait definition.

use colloquy_types::error::RepositoryError;
use colloquy_types::id::UserId;
use colloquy_types::user::User;

/// Repository trait for the user directory that chats reference.
pub trait UserRepository: Send + Sync {
    /// Insert a user, or update name/username/image if the id already exists.
    ///
    /// Returns `RepositoryError::Conflict` when the username belongs to another user.
    fn upsert(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn get_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// All users ordered by username.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<User>, RepositoryError>> + Send;
}
