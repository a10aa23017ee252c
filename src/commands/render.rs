//! Terminal rendering for chat views and session listings

use colored::Colorize;
use prettytable::{format, row, Table};

use crate::controller::{ChatNotice, ChatView};
use crate::session::normalize::parse_timestamp;
use crate::session::{ChatSession, Message, QueryMetadata, Role};

/// Heading of the new-chat guidance
pub const PLACEHOLDER_TITLE: &str = "Discover Movies Through Stories";

/// Example prompts shown under the guidance heading
pub const EXAMPLE_PROMPTS: [&str; 2] = [
    "Show me movies about betrayal",
    "Find films that feel like Spirited Away",
];

/// Guidance shown while the selected conversation is empty
pub fn placeholder() -> String {
    let mut out = format!("\n  {}\n\n", PLACEHOLDER_TITLE.bold());
    out.push_str("  Ask me about movies in natural language. Find films by themes,\n");
    out.push_str("  characters, emotions, or specific scenes. Try:\n\n");
    for prompt in EXAMPLE_PROMPTS {
        out.push_str(&format!("    \"{}\"\n", prompt.cyan()));
    }
    out
}

/// Diagnostic lines for an assistant reply
///
/// The result count line only appears when there are results.
pub fn metadata_lines(metadata: &QueryMetadata) -> Vec<String> {
    let label = metadata.detected_label.as_deref().unwrap_or("unknown");
    let mut lines = vec![format!("Query type: {}", label)];
    if !metadata.results.is_empty() {
        lines.push(format!("Found {} relevant results", metadata.results.len()));
    }
    lines
}

/// One message with its author label, and metadata when enabled
pub fn format_message(message: &Message, show_metadata: bool) -> String {
    let label = match message.role {
        Role::User => "You".green().bold(),
        Role::Assistant => "MediaGraph".blue().bold(),
    };
    let mut out = format!("{}: {}", label, message.content);

    if show_metadata && message.role == Role::Assistant {
        if let Some(metadata) = &message.query_metadata {
            for line in metadata_lines(metadata) {
                out.push_str(&format!("\n  {}", line.dimmed()));
            }
        }
    }
    out
}

/// Body of the chat: guidance when empty, otherwise every message
pub fn format_conversation(view: &ChatView, show_metadata: bool) -> String {
    if view.is_new_chat {
        return placeholder();
    }
    let mut out = String::new();
    for message in &view.messages {
        out.push('\n');
        out.push_str(&format_message(message, show_metadata));
        out.push('\n');
    }
    out
}

/// One-line description of a failure notice
pub fn format_notice(notice: &ChatNotice) -> String {
    format!(
        "Could not {} ({}): {}",
        notice.operation, notice.kind, notice.message
    )
}

/// Shorten `title` to at most `max` characters
pub fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let kept: String = title.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Render a backend timestamp as `YYYY-MM-DD HH:MM` (UTC), or pass it
/// through when it does not parse
pub fn format_timestamp(timestamp: &str) -> String {
    parse_timestamp(timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Numbered conversation list for the interactive `/history` command
pub fn history_table(view: &ChatView, max_title_width: usize) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["#".bold(), "Title".bold(), "Messages".bold(), "ID".bold()]);

    for (index, conversation) in view.conversations.iter().enumerate() {
        let marker = if conversation.selected { "*" } else { " " };
        let title = truncate_title(&conversation.title, max_title_width);
        let id = conversation
            .session_id
            .clone()
            .unwrap_or_else(|| "(not saved)".to_string());
        table.add_row(row![
            format!("{}{}", marker, index + 1),
            title,
            conversation.message_count,
            id.cyan()
        ]);
    }
    table
}

/// Table of backend sessions for `sessions list`
pub fn sessions_table(sessions: &[ChatSession], max_title_width: usize) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["ID".bold(), "Title".bold(), "Created".bold()]);

    for session in sessions {
        table.add_row(row![
            session.id.cyan(),
            truncate_title(&session.title, max_title_width),
            format_timestamp(&session.timestamp)
        ]);
    }
    table
}
