//! Global configuration types for Colloquy.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls chat
//! defaults, search ordering, and database tuning.

use serde::{Deserialize, Serialize};

use crate::user::Image;

/// Top-level configuration for Colloquy.
///
/// Loaded from `~/.colloquy/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub chat_defaults: ChatDefaults,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Values applied to new chats when the request leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDefaults {
    /// Image used for chats created without one.
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: Image,
}

fn default_placeholder_image() -> Image {
    Image::new(
        "https://i.ibb.co/bRb0SYw/chat-placeholder.png",
        "https://i.ibb.co/FqHrScZ/chat-placeholder.png",
    )
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            placeholder_image: default_placeholder_image(),
        }
    }
}

/// Ordering applied when listing a user's chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatOrder {
    /// Timestamp of each chat's *first* message, newest first.
    #[default]
    FirstMessage,
    /// Timestamp of each chat's latest message, newest first.
    LatestMessage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub order: ChatOrder,
}

/// SQLite pool tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_reader_connections")]
    pub reader_connections: u32,

    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_reader_connections() -> u32 {
    8
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            reader_connections: default_reader_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.search.order, ChatOrder::FirstMessage);
        assert_eq!(config.database.reader_connections, 8);
        assert_eq!(config.database.busy_timeout_secs, 5);
        assert!(config
            .chat_defaults
            .placeholder_image
            .thumbnail
            .ends_with("chat-placeholder.png"));
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.search.order, ChatOrder::FirstMessage);
        assert!(!config.chat_defaults.placeholder_image.original.is_empty());
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
[chat_defaults.placeholder_image]
thumbnail = "https://cdn.example.com/t.png"
original = "https://cdn.example.com/o.png"

[search]
order = "latest_message"

[database]
reader_connections = 2
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.chat_defaults.placeholder_image.original,
            "https://cdn.example.com/o.png"
        );
        assert_eq!(config.search.order, ChatOrder::LatestMessage);
        assert_eq!(config.database.reader_connections, 2);
        assert_eq!(config.database.busy_timeout_secs, 5);
    }
}
