//! Session inspection CLI commands: list and transcript.
//!
//! Both read straight from the database; neither needs the provider or a
//! token secret.

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use astroline_core::chat::store::SessionStore;
use astroline_infra::sqlite::chat::SqliteSessionRepository;
use astroline_types::chat::{ChatRole, OwnerId, SessionSummary};

use crate::state::Storage;

/// List an owner's sessions, most recently active first.
///
/// # Examples
///
/// ```bash
/// astroline sessions user-42
/// astroline sessions user-42 --all --json
/// ```
pub async fn list_sessions(storage: &Storage, owner: &str, all: bool, json: bool) -> Result<()> {
    let owner = OwnerId::new(owner);
    let sessions = storage
        .session_store()
        .list(&owner, !all)
        .await
        .context("failed to list sessions")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No {}sessions found for '{}'.",
            style("i").blue().bold(),
            if all { "" } else { "active " },
            style(&owner).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("  Sessions for '{}'", style(&owner).cyan().bold());
    println!();
    println!("{}", sessions_table(&sessions));
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn sessions_table(sessions: &[SessionSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Last activity").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for session in sessions {
        let status_cell = if session.is_active {
            Cell::new("active").fg(Color::Green)
        } else {
            Cell::new("ended").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(session.id).fg(Color::DarkGrey),
            Cell::new(truncate(&session.title, 40)).fg(Color::Cyan),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M")).fg(Color::White),
            Cell::new(session.message_count).fg(Color::White),
            status_cell,
        ]);
    }

    table
}

/// Print a session's transcript.
///
/// # Examples
///
/// ```bash
/// astroline history user-42 0190f3c2-...
/// ```
pub async fn show_history(
    storage: &Storage,
    owner: &str,
    session_id: &str,
    json: bool,
) -> Result<()> {
    let owner = OwnerId::new(owner);
    let id = SessionStore::<SqliteSessionRepository>::resolve_id(session_id)
        .with_context(|| format!("Session '{session_id}' not found"))?;
    let session = storage
        .session_store()
        .get(&id, &owner)
        .await
        .with_context(|| format!("Session '{session_id}' not found for '{owner}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(session.messages())?);
        return Ok(());
    }

    println!();
    println!("  {}", style(session.title()).cyan().bold());
    println!(
        "  {} · {} message{} · {}",
        session.created_at.format("%Y-%m-%d %H:%M UTC"),
        session.message_count(),
        if session.message_count() == 1 { "" } else { "s" },
        session.status()
    );
    println!();

    for message in session.messages() {
        let label = match message.role {
            ChatRole::User => style("You").green().bold(),
            ChatRole::Assistant => style("Assistant").magenta().bold(),
        };
        println!(
            "  {} {}",
            label,
            style(message.created_at.format("%H:%M:%S")).dim()
        );
        for line in message.content.lines() {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}

/// Shorten `text` to at most `max` characters, marking the cut with "...".
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}
