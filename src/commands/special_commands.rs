//! Special commands parser for the interactive chat
//!
//! Special commands manage conversations instead of being sent to the
//! backend as queries. They are prefixed with `/` and the command word is
//! case-insensitive; arguments (conversation references, titles) keep
//! their case.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// Conversation references are either a 1-based position in the
/// `/history` listing or a conversation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new, empty conversation
    NewChat,

    /// Reload and list the conversation history
    History,

    /// Switch to another conversation
    Select(String),

    /// Rename a conversation
    Rename { target: String, title: String },

    /// Delete a conversation
    Delete(String),

    /// Show backend and conversation status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the backend as a query.
    None,
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn no_argument(
    command: &str,
    rest: &str,
    cmd: SpecialCommand,
) -> Result<SpecialCommand, CommandError> {
    if rest.is_empty() {
        Ok(cmd)
    } else {
        Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: rest.to_string(),
        })
    }
}

/// Parse a user input string into a special command
///
/// Returns `SpecialCommand::None` for anything that is not a command,
/// which the caller sends as a query.
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not a valid command.
/// Returns `CommandError::UnsupportedArgument` if a command receives an argument it does not take.
/// Returns `CommandError::MissingArgument` if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use mediagraph::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/select 2").unwrap();
/// assert_eq!(cmd, SpecialCommand::Select("2".to_string()));
///
/// let cmd = parse_special_command("/rename 1 Heist films").unwrap();
/// assert_eq!(
///     cmd,
///     SpecialCommand::Rename { target: "1".to_string(), title: "Heist films".to_string() }
/// );
///
/// let cmd = parse_special_command("movies with talking animals").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower, ""),
    };

    match word.as_str() {
        "/new" => no_argument("/new", rest, SpecialCommand::NewChat),
        "/history" | "/sessions" => no_argument("/history", rest, SpecialCommand::History),
        "/status" => no_argument("/status", rest, SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        "/select" | "/open" => {
            if rest.is_empty() {
                return Err(missing("/select", "/select <number|id>"));
            }
            Ok(SpecialCommand::Select(rest.to_string()))
        }

        "/delete" => {
            if rest.is_empty() {
                return Err(missing("/delete", "/delete <number|id>"));
            }
            Ok(SpecialCommand::Delete(rest.to_string()))
        }

        "/rename" => {
            let usage = "/rename <number|id> <title>";
            let (target, title) = rest
                .split_once(char::is_whitespace)
                .map(|(t, title)| (t, title.trim()))
                .unwrap_or((rest, ""));
            if target.is_empty() || title.is_empty() {
                return Err(missing("/rename", usage));
            }
            Ok(SpecialCommand::Rename {
                target: target.to_string(),
                title: title.to_string(),
            })
        }

        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

CONVERSATIONS:
  /new                     - Start a new chat
  /history                 - Reload and list past conversations
  /select <number|id>      - Switch to a conversation from the list
  /rename <number|id> <title> - Rename a conversation (local only)
  /delete <number|id>      - Delete a conversation (local only)

INFORMATION:
  /status                  - Show backend, session and message counts
  /help                    - Show this help message

SESSION CONTROL:
  exit, quit               - Exit interactive chat

Anything else is sent to the backend as a question, for example:
  Show me movies about betrayal
  Find films that feel like Spirited Away
"#
    );
}
