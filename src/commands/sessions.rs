use crate::cli::SessionCommand;
use crate::commands::render;
use crate::config::Config;
use crate::error::{MediaGraphError, Result};
use colored::Colorize;

/// Handle session commands
pub async fn handle_sessions(config: &Config, command: SessionCommand) -> Result<()> {
    let transport = super::build_transport(config)?;

    match command {
        SessionCommand::List { json } => {
            let sessions = transport
                .list_sessions()
                .await
                .map_err(MediaGraphError::from)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&sessions).map_err(MediaGraphError::from)?
                );
                return Ok(());
            }

            if sessions.is_empty() {
                println!("{}", "No chat sessions found.".yellow());
                return Ok(());
            }

            println!("\nChat Sessions:");
            render::sessions_table(&sessions, config.display.max_title_width).printstd();
            println!();
            println!(
                "Use {} to continue a session.",
                "mediagraph chat --session <ID>".cyan()
            );
            println!();
        }
        SessionCommand::Show { id, json } => {
            let session = transport
                .get_session(&id)
                .await
                .map_err(MediaGraphError::from)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&session).map_err(MediaGraphError::from)?
                );
                return Ok(());
            }

            println!(
                "\n{} ({})",
                session.title.bold(),
                render::format_timestamp(&session.timestamp)
            );
            let messages = session.messages.unwrap_or_default();
            if messages.is_empty() {
                println!("{}", "No messages yet.".yellow());
            }
            for message in &messages {
                println!(
                    "\n{}",
                    render::format_message(message, config.display.show_metadata)
                );
            }
            println!();
        }
        SessionCommand::Create => {
            let id = transport
                .create_session()
                .await
                .map_err(MediaGraphError::from)?;
            println!("{}", id);
        }
    }

    Ok(())
}
