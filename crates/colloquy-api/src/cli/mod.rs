//! CLI command definitions and dispatch for the `colq` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a noun-verb
//! pattern (e.g., `colq chat list`, `colq user add`).

pub mod chat;
pub mod user;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Query and update chats stored in Colloquy.
#[derive(Parser)]
#[command(name = "colq", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit diagnostic logs on stderr as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true, hide = true)]
    pub otel: bool,

    /// Act as this user (username or id). Required by caller-relative commands.
    #[arg(long = "as", global = true, env = "COLLOQUY_USER", value_name = "USER")]
    pub caller: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the user directory.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Query and update chats.
    Chat {
        #[command(subcommand)]
        action: ChatCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user, or update name and image of an existing username.
    Add {
        /// Unique username.
        username: String,

        /// Display name.
        #[arg(long)]
        name: String,

        /// Thumbnail image URL.
        #[arg(long)]
        thumbnail: Option<String>,

        /// Full-size image URL (defaults to the thumbnail).
        #[arg(long)]
        original: Option<String>,
    },

    /// List registered users.
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum ChatCommand {
    /// Create a chat between users.
    Create {
        /// Chat title.
        title: String,

        /// Participants (usernames or ids). Repeat or comma-separate.
        #[arg(long = "with", required = true, value_delimiter = ',', num_args = 1..)]
        participants: Vec<String>,

        /// Create a group chat instead of a direct chat.
        #[arg(long)]
        group: bool,

        /// Admin user (defaults to the acting user, if any).
        #[arg(long)]
        admin: Option<String>,

        /// Free-form description.
        #[arg(long)]
        description: Option<String>,
    },

    /// List every chat in storage order.
    #[command(alias = "ls")]
    List,

    /// Show one chat with its messages.
    Show {
        /// Chat id.
        id: String,
    },

    /// Find the chat whose participants are exactly the given users.
    Find {
        /// Participants (usernames or ids).
        #[arg(required = true, value_delimiter = ',', num_args = 1..)]
        participants: Vec<String>,
    },

    /// List the acting user's chats, optionally filtered by title.
    Search {
        /// Case-insensitive title substring.
        filter: Option<String>,
    },

    /// Check whether a chat with this exact title exists.
    Exists {
        /// Exact title.
        title: String,
    },

    /// Count all chats.
    Count,

    /// Mark a message read for the acting user.
    Read {
        /// Chat id.
        chat: String,

        /// Message id.
        message: String,
    },

    /// Post a message as the acting user.
    Post {
        /// Chat id.
        chat: String,

        /// Message content.
        content: String,

        /// Message type: message, notification, singleEmoji.
        #[arg(long, default_value = "message")]
        kind: String,

        /// Explicit recipients (usernames or ids). Defaults to every other participant.
        #[arg(long = "to", value_delimiter = ',')]
        recipients: Vec<String>,
    },
}
