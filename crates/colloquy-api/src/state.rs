//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository traits, but AppState pins them to the
//! SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use colloquy_core::chat::service::ChatService;
use colloquy_core::user::service::UserService;
use colloquy_infra::config::{load_global_config, resolve_data_dir};
use colloquy_infra::sqlite::chat::SqliteChatRepository;
use colloquy_infra::sqlite::pool::{DatabasePool, database_url};
use colloquy_infra::sqlite::user::SqliteUserRepository;
use colloquy_types::config::GlobalConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository, SqliteUserRepository>;

pub type ConcreteUserService = UserService<SqliteUserRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub user_service: Arc<ConcreteUserService>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::with_config(&database_url(&data_dir), &config.database).await?;

        Ok(Self::from_parts(data_dir, db_pool, config))
    }

    /// Wire services over an already-open pool.
    pub fn from_parts(data_dir: PathBuf, db_pool: DatabasePool, config: GlobalConfig) -> Self {
        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool.clone()),
            SqliteUserRepository::new(db_pool.clone()),
            &config,
        );
        let user_service = UserService::new(SqliteUserRepository::new(db_pool.clone()));

        tracing::debug!(data_dir = %data_dir.display(), order = ?config.search.order, "Application state ready");

        Self {
            chat_service: Arc::new(chat_service),
            user_service: Arc::new(user_service),
            config: Arc::new(config),
            data_dir,
            db_pool,
        }
    }
}
