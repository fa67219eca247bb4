//! User directory CLI commands: add, list.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use colloquy_types::user::Image;

use crate::state::AppState;

/// Register a user or refresh an existing one.
///
/// ```bash
/// colq user add ada --name "Ada Lovelace" --thumbnail https://example.com/ada.png
/// ```
pub async fn add_user(
    state: &AppState,
    username: &str,
    name: &str,
    thumbnail: Option<String>,
    original: Option<String>,
    json: bool,
) -> Result<()> {
    let image = match (thumbnail, original) {
        (None, None) => None,
        (Some(t), None) => Some(Image::new(t.clone(), t)),
        (None, Some(o)) => Some(Image::new(o.clone(), o)),
        (Some(t), Some(o)) => Some(Image::new(t, o)),
    };

    let user = state.user_service.register_user(username, name, image).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!();
    println!("  {} User saved", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Username:").bold(), style(&user.username).cyan());
    println!("  {}      {}", style("Name:").bold(), user.name);
    println!("  {}        {}", style("ID:").bold(), style(user.id.to_string()).dim());
    println!();

    Ok(())
}

/// List all users in a table.
pub async fn list_users(state: &AppState, json: bool) -> Result<()> {
    let users = state.user_service.list_users().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!();
        println!(
            "  {} No users yet. Add one with: {}",
            style("i").blue().bold(),
            style("colq user add <username> --name <name>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Username").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for user in &users {
        table.add_row(vec![
            Cell::new(&user.username).fg(Color::Cyan),
            Cell::new(&user.name),
            Cell::new(user.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} user(s)", users.len());
    println!();

    Ok(())
}
