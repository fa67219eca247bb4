//! Chat CLI commands: create, list, show, find, search, exists, count, read, post.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use colloquy_core::chat::service::{parse_chat_id, parse_message_id};
use colloquy_core::chat::view;
use colloquy_types::chat::{Chat, MessageKind, NewChat, NewMessage};
use colloquy_types::error::ChatError;
use colloquy_types::id::UserId;
use colloquy_types::user::User;

use crate::state::AppState;

/// Resolve the `--as` user, if one was given.
pub async fn resolve_caller(state: &AppState, caller: Option<&str>) -> Result<Option<User>> {
    match caller {
        Some(raw) => Ok(Some(state.user_service.resolve_user(raw).await?)),
        None => Ok(None),
    }
}

/// Resolve the `--as` user or fail with NOT_AUTHENTICATED.
async fn require_caller(state: &AppState, caller: Option<&str>) -> Result<User> {
    resolve_caller(state, caller)
        .await?
        .ok_or_else(|| ChatError::Unauthenticated.into())
}

async fn resolve_users(state: &AppState, raw: &[String]) -> Result<Vec<UserId>> {
    let mut ids = Vec::with_capacity(raw.len());
    for entry in raw {
        ids.push(state.user_service.resolve_user(entry.trim()).await?.id);
    }
    Ok(ids)
}

/// Arguments of `colq chat create`, with users still as typed.
#[derive(Debug)]
pub struct CreateChatArgs {
    pub title: String,
    pub participants: Vec<String>,
    pub group: bool,
    /// Defaults to the `--as` user.
    pub admin: Option<String>,
    pub description: Option<String>,
}

/// Create a chat.
///
/// ```bash
/// colq --as ada chat create "Ada & Bob" --with ada,bob
/// colq --as ada chat create "Book Club" --with ada,bob,cy --group
/// ```
pub async fn create_chat(
    state: &AppState,
    caller: Option<&str>,
    args: CreateChatArgs,
    json: bool,
) -> Result<()> {
    let participants = resolve_users(state, &args.participants).await?;
    let admin = match args.admin.as_deref() {
        Some(raw) => Some(state.user_service.resolve_user(raw).await?.id),
        None => resolve_caller(state, caller).await?.map(|u| u.id),
    };

    let chat = state
        .chat_service
        .create_chat(NewChat {
            title: args.title,
            participants,
            is_group_chat: args.group,
            admin,
            description: args.description,
            image: None,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chat)?);
        return Ok(());
    }

    println!();
    println!("  {} Chat created", style("✓").green().bold());
    println!();
    println!("  {}   {}", style("Title:").bold(), style(&chat.title).cyan());
    println!(
        "  {}    {}",
        style("Kind:").bold(),
        if chat.is_group_chat { "group" } else { "direct" }
    );
    println!("  {} {}", style("Members:").bold(), member_names(&chat));
    println!("  {}      {}", style("ID:").bold(), style(chat.id.to_string()).dim());
    println!();

    Ok(())
}

/// List every chat in storage order.
pub async fn list_chats(state: &AppState, json: bool) -> Result<()> {
    let chats = state.chat_service.list_all_chats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chats)?);
        return Ok(());
    }

    print_chat_table(&chats, None);
    Ok(())
}

/// Show one chat with its messages and receipts.
pub async fn show_chat(
    state: &AppState,
    caller: Option<&str>,
    id: &str,
    json: bool,
) -> Result<()> {
    let chat = state
        .chat_service
        .get_chat_by_id(id)
        .await?
        .ok_or_else(|| ChatError::NotFound(format!("chat {id}")))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chat)?);
        return Ok(());
    }

    let caller = resolve_caller(state, caller).await?;
    let title = match &caller {
        Some(user) => state.chat_service.display_title(&chat, &user.id)?.to_string(),
        None => chat.title.clone(),
    };

    println!();
    println!("  {}", style(&title).cyan().bold());
    if !chat.description.is_empty() {
        println!("  {}", style(&chat.description).dim());
    }
    println!();
    println!("  {} {}", style("Members:").bold(), member_names(&chat));
    if let Some(admin) = &chat.admin {
        println!("  {}   {}", style("Admin:").bold(), admin.username);
    }
    println!("  {}      {}", style("ID:").bold(), style(chat.id.to_string()).dim());
    println!();

    if chat.messages.is_empty() {
        println!("  {} No messages yet", style("i").blue().bold());
        println!();
        return Ok(());
    }

    for message in &chat.messages {
        let sender = message
            .sender
            .as_ref()
            .map(|s| s.username.as_str())
            .unwrap_or("(unknown)");
        let read = message.is_read_by.iter().filter(|r| r.is_read).count();
        let unread_marker = match &caller {
            Some(user) if message.read_state(&user.id) == Some(false) => {
                format!(" {}", style("●").yellow())
            }
            _ => String::new(),
        };

        match message.kind {
            MessageKind::Notification => {
                println!(
                    "  {} {}",
                    style(format_time(&message.created_at)).dim(),
                    style(&message.content).italic()
                );
            }
            MessageKind::Message | MessageKind::SingleEmoji => {
                println!(
                    "  {} {}: {}{}",
                    style(format_time(&message.created_at)).dim(),
                    style(sender).bold(),
                    message.content,
                    unread_marker
                );
            }
        }
        println!(
            "      {}",
            style(format!(
                "read {read}/{}  id {}",
                message.is_read_by.len(),
                message.id
            ))
            .dim()
        );
    }
    println!();

    Ok(())
}

/// Find the chat with exactly these participants.
pub async fn find_chat(state: &AppState, participants: &[String], json: bool) -> Result<()> {
    let ids = resolve_users(state, participants).await?;
    let found = state.chat_service.find_chat_by_participants(&ids).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    match found {
        Some(chat) => {
            println!();
            println!(
                "  {} {} {}",
                style("✓").green().bold(),
                style(&chat.title).cyan(),
                style(chat.id.to_string()).dim()
            );
            println!();
        }
        None => {
            println!();
            println!(
                "  {} No chat with exactly those participants",
                style("i").blue().bold()
            );
            println!();
        }
    }
    Ok(())
}

/// List the caller's chats, filtered by title and ordered by message time.
pub async fn search_chats(
    state: &AppState,
    caller: Option<&str>,
    filter: Option<&str>,
    json: bool,
) -> Result<()> {
    let caller = resolve_caller(state, caller).await?;
    let chats = state
        .chat_service
        .list_chats_for_user(caller.as_ref().map(|u| &u.id), filter)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chats)?);
        return Ok(());
    }

    print_chat_table(&chats, caller.as_ref());
    Ok(())
}

pub async fn title_exists(state: &AppState, title: &str, json: bool) -> Result<()> {
    let exists = state.chat_service.chat_title_exists(title).await?;

    if json {
        println!("{}", serde_json::json!({ "title": title, "exists": exists }));
    } else if exists {
        println!("  {} A chat titled '{}' exists", style("✓").green(), title);
    } else {
        println!("  {} No chat titled '{}'", style("✗").red(), title);
    }
    Ok(())
}

pub async fn count_chats(state: &AppState, json: bool) -> Result<()> {
    let count = state.chat_service.count_chats().await?;

    if json {
        println!("{}", serde_json::json!({ "count": count }));
    } else {
        println!("{count}");
    }
    Ok(())
}

/// Mark a message read for the acting user.
pub async fn mark_read(
    state: &AppState,
    caller: Option<&str>,
    chat: &str,
    message: &str,
    json: bool,
) -> Result<()> {
    let member = require_caller(state, caller).await?;
    let chat_id = parse_chat_id(chat)?;
    let message_id = parse_message_id(message)?;

    state
        .chat_service
        .mark_message_read(&chat_id, &message_id, &member.id)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "chat_id": chat_id, "message_id": message_id, "member": member.id, "is_read": true })
        );
    } else {
        println!("  {} Marked read", style("✓").green().bold());
    }
    Ok(())
}

/// Post a message as the acting user.
pub async fn post_message(
    state: &AppState,
    caller: Option<&str>,
    chat: &str,
    content: String,
    kind: &str,
    recipients: &[String],
    json: bool,
) -> Result<()> {
    let sender = require_caller(state, caller).await?;
    let chat_id = parse_chat_id(chat)?;
    let kind: MessageKind = kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid --kind")?;
    let recipients = if recipients.is_empty() {
        None
    } else {
        Some(resolve_users(state, recipients).await?)
    };

    let message = state
        .chat_service
        .post_message(
            &chat_id,
            NewMessage {
                content,
                kind,
                sender: Some(sender.id),
                image: None,
                recipients,
            },
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&message)?);
        return Ok(());
    }

    println!(
        "  {} Posted {} {}",
        style("✓").green().bold(),
        message.kind,
        style(message.id.to_string()).dim()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn print_chat_table(chats: &[Chat], caller: Option<&User>) {
    if chats.is_empty() {
        println!();
        println!(
            "  {} No chats found. Create one with: {}",
            style("i").blue().bold(),
            style("colq chat create <title> --with <users>").yellow()
        );
        println!();
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Members").fg(Color::White),
        Cell::new("Latest").fg(Color::White),
    ];
    if caller.is_some() {
        header.push(Cell::new("Unread").fg(Color::White));
    }
    header.push(Cell::new("ID").fg(Color::White));
    table.set_header(header);

    for chat in chats {
        let title = match caller {
            Some(user) => match view::display_title(chat, &user.id) {
                Ok(title) => title.to_string(),
                Err(e) => {
                    tracing::warn!(chat_id = %chat.id, error = %e, "Falling back to stored title");
                    chat.title.clone()
                }
            },
            None => chat.title.clone(),
        };
        let kind = if chat.is_group_chat {
            Cell::new("group").fg(Color::Magenta)
        } else {
            Cell::new("direct").fg(Color::Blue)
        };
        let latest = chat
            .latest_message()
            .map(|m| format_time(&m.created_at))
            .unwrap_or_else(|| "never".to_string());

        let mut row = vec![
            Cell::new(title).fg(Color::Cyan),
            kind,
            Cell::new(chat.participants.len()),
            Cell::new(latest),
        ];
        if let Some(user) = caller {
            let unread = view::unread_count(chat, &user.id);
            let cell = if unread > 0 {
                Cell::new(unread).fg(Color::Yellow)
            } else {
                Cell::new(unread).fg(Color::DarkGrey)
            };
            row.push(cell);
        }
        row.push(Cell::new(chat.id.to_string()).fg(Color::DarkGrey));
        table.add_row(row);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} chat(s)", chats.len());
    println!();
}

fn member_names(chat: &Chat) -> String {
    chat.participants
        .iter()
        .map(|p| p.username.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}
