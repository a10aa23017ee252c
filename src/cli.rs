//! Command-line interface definition for MediaGraph
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive chat plus one-shot session commands.

use clap::{Parser, Subcommand};

/// MediaGraph - discover movies through conversation
///
/// Talks to a MediaGraph backend: ask natural-language questions about
/// movies, characters, scenes and themes, and browse past chat sessions.
#[derive(Parser, Debug, Clone)]
#[command(name = "mediagraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the backend base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for MediaGraph
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive chat
    Chat {
        /// Open an existing backend session instead of a new chat
        #[arg(short, long)]
        session: Option<String>,

        /// Do not load the session history on start
        #[arg(long)]
        no_history: bool,
    },

    /// Send a single query and print the reply
    Ask {
        /// Natural-language query
        query: String,

        /// Session to send the query in (a new one is created if omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect backend chat sessions
    Sessions {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Show backend health
    Health {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Session inspection subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List all sessions
    List {
        /// Print sessions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the messages of one session
    Show {
        /// Session identifier
        id: String,

        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an empty session and print its id
    Create,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            base_url: None,
            verbose: false,
            json_logs: false,
            command: Commands::Chat {
                session: None,
                no_history: false,
            },
        }
    }
}
