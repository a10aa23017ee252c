/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes these top-level command modules:

- `chat`     — Interactive chat
- `ask`      — Send a single query
- `sessions` — Inspect backend sessions
- `health`   — Backend health report

The handlers are thin: they build an HTTP transport from the
configuration and drive either the transport directly (one-shot
commands) or a [`ChatController`](crate::controller::ChatController)
(interactive chat).
*/

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::transport::{HttpSessionTransport, SessionTransport};

// Terminal rendering helpers
pub mod render;

// Backend session inspection
pub mod sessions;

// Special commands parser for the interactive chat
pub mod special_commands;

/// Build the HTTP transport described by `config`
pub fn build_transport(config: &Config) -> Result<Arc<dyn SessionTransport>> {
    let transport = HttpSessionTransport::new(&config.api)?;
    tracing::debug!(base_url = %transport.base_url(), "Using MediaGraph backend");
    Ok(Arc::new(transport))
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Runs a readline loop over a [`ChatController`]: plain lines are sent
    //! as queries, `/` commands manage conversations.

    use super::render;
    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::config::Config;
    use crate::controller::{ChatController, ChatView, SendStatus};
    use crate::error::{MediaGraphError, Result};
    use crate::transport::SessionTransport;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    const PROMPT: &str = ">> ";

    /// Start the interactive chat
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `session` - Backend session to open instead of starting a new chat
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediagraph::commands::chat;
    /// use mediagraph::config::Config;
    ///
    /// # async fn example() -> mediagraph::error::Result<()> {
    /// chat::run_chat(Config::default(), None).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_chat(config: Config, session: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat");

        let transport = super::build_transport(&config)?;
        let controller = ChatController::new(transport, config.chat.clone());
        let mut rl = DefaultEditor::new().map_err(MediaGraphError::from)?;

        print_welcome_banner(&config);

        if config.chat.load_history_on_start {
            controller.load_history().await;
        }

        let opened = match session.as_deref() {
            Some(id) => controller.open_session(id).await,
            None => false,
        };
        if !opened {
            controller.start_new_chat().await;
        }

        print_notices(&controller);
        print!(
            "{}",
            render::format_conversation(&controller.view(), config.display.show_metadata)
        );

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed).map_err(MediaGraphError::from)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => send(&controller, trimmed, &config).await,
                        other => handle_command(&controller, other, &config).await,
                    }

                    print_notices(&controller);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn send<T: SessionTransport + ?Sized>(
        controller: &ChatController<T>,
        text: &str,
        config: &Config,
    ) {
        println!("{}", "Searching the graph...".dimmed());
        if let SendStatus::Delivered { .. } = controller.send(text).await {
            if let Some(reply) = controller.view().messages.last() {
                println!(
                    "\n{}\n",
                    render::format_message(reply, config.display.show_metadata)
                );
            }
        }
    }

    async fn handle_command<T: SessionTransport + ?Sized>(
        controller: &ChatController<T>,
        command: SpecialCommand,
        config: &Config,
    ) {
        let show_metadata = config.display.show_metadata;
        match command {
            SpecialCommand::NewChat => {
                controller.start_new_chat().await;
                print!("{}", render::placeholder());
            }
            SpecialCommand::History => {
                controller.load_history().await;
                print_history(&controller.view(), config);
            }
            SpecialCommand::Select(target) => match resolve_target(&controller.view(), &target) {
                Some(id) => {
                    if controller.select(&id).await {
                        print!(
                            "{}",
                            render::format_conversation(&controller.view(), show_metadata)
                        );
                    }
                }
                None => unknown_target(&target),
            },
            SpecialCommand::Rename { target, title } => {
                match resolve_target(&controller.view(), &target) {
                    Some(id) if controller.rename(&id, &title) => {
                        println!("{}\n", format!("Renamed to \"{}\"", title).green());
                    }
                    Some(_) => eprintln!("{}\n", "Title cannot be empty".red()),
                    None => unknown_target(&target),
                }
            }
            SpecialCommand::Delete(target) => match resolve_target(&controller.view(), &target) {
                Some(id) => {
                    let was_selected = controller.selected_id().as_deref() == Some(id.as_str());
                    if controller.delete(&id) {
                        println!("{}\n", "Conversation deleted".green());
                        if was_selected {
                            print!("{}", render::placeholder());
                        }
                    }
                }
                None => unknown_target(&target),
            },
            SpecialCommand::ShowStatus => print_status(controller, config).await,
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
    }

    /// Map a `/select`-style reference to a conversation id
    ///
    /// Accepts a 1-based position in the listing, a conversation id or a
    /// backend session id.
    pub(crate) fn resolve_target(view: &ChatView, target: &str) -> Option<String> {
        if let Ok(position) = target.parse::<usize>() {
            if let Some(c) = position
                .checked_sub(1)
                .and_then(|i| view.conversations.get(i))
            {
                return Some(c.id.clone());
            }
        }
        view.conversations
            .iter()
            .find(|c| c.id == target || c.session_id.as_deref() == Some(target))
            .map(|c| c.id.clone())
    }

    fn unknown_target(target: &str) {
        eprintln!(
            "{}\n",
            format!("No conversation matches '{}'. Type /history to list them.", target).red()
        );
    }

    fn print_notices<T: SessionTransport + ?Sized>(controller: &ChatController<T>) {
        for notice in controller.take_notices() {
            eprintln!("{}\n", render::format_notice(&notice).red());
        }
    }

    fn print_history(view: &ChatView, config: &Config) {
        if view.conversations.is_empty() {
            println!("{}\n", "No conversations yet.".yellow());
            return;
        }
        println!("\nConversations:");
        render::history_table(view, config.display.max_title_width).printstd();
        println!("Use {} to switch.\n", "/select <number>".cyan());
    }

    /// Display a welcome banner at the start of the interactive chat
    fn print_welcome_banner(config: &Config) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              MediaGraph Interactive Chat - Welcome!          ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Backend: {}", config.api.base_url.cyan());
        println!("Type '/help' for available commands, 'exit' to quit");
    }

    async fn print_status<T: SessionTransport + ?Sized>(
        controller: &ChatController<T>,
        config: &Config,
    ) {
        let view = controller.view();
        let selected = view.conversations.iter().find(|c| c.selected);

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    MediaGraph Chat Status                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Backend:       {}", config.api.base_url);
        match controller.transport().health().await {
            Ok(report) if report.is_healthy() => {
                println!("Health:        {}", report.status.green())
            }
            Ok(report) => println!("Health:        {}", report.status.yellow()),
            Err(e) => println!("Health:        {}", e.kind().to_string().red()),
        }
        println!("Conversations: {}", view.conversations.len());
        match selected {
            Some(c) => {
                println!("Selected:      {}", c.title);
                println!(
                    "Session:       {}",
                    c.session_id.as_deref().unwrap_or("(not created yet)")
                );
                println!("Messages:      {}", c.message_count);
            }
            None => println!("Selected:      (none)"),
        }
        println!();
    }

}

// One-shot query handler
pub mod ask {
    //! Send a single query and print the reply.

    use super::render;
    use crate::config::Config;
    use crate::error::{MediaGraphError, Result};

    /// Send `query`, creating a session when `session` is `None`
    ///
    /// # Errors
    ///
    /// Returns error if the query is blank or the backend call fails
    pub async fn run_ask(
        config: &Config,
        query: &str,
        session: Option<&str>,
        json: bool,
    ) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MediaGraphError::Command("Query cannot be empty".to_string()).into());
        }

        let transport = super::build_transport(config)?;
        let result = transport
            .send_message(query, session)
            .await
            .map_err(MediaGraphError::from)?;

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).map_err(MediaGraphError::from)?
            );
        } else {
            println!(
                "{}",
                render::format_message(&result.messages[1], config.display.show_metadata)
            );
            eprintln!("session: {}", result.session_id);
        }
        Ok(())
    }
}

// Backend health handler
pub mod health {
    //! Print the backend health report.

    use crate::config::Config;
    use crate::error::{MediaGraphError, Result};
    use colored::Colorize;

    /// Query `GET /health` and print the report
    pub async fn run_health(config: &Config, json: bool) -> Result<()> {
        let transport = super::build_transport(config)?;
        let report = transport.health().await.map_err(MediaGraphError::from)?;

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).map_err(MediaGraphError::from)?
            );
            return Ok(());
        }

        let status = if report.is_healthy() {
            report.status.green()
        } else {
            report.status.yellow()
        };
        println!("Status: {}", status);
        for (name, value) in &report.services {
            println!("  {}: {}", name, value);
        }
        Ok(())
    }
}
