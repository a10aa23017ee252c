//! MediaGraph - movie discovery chat CLI
//!
#![doc = "MediaGraph - movie discovery chat CLI"]
#![doc = "Main entry point for the MediaGraph chat client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mediagraph::cli::{Cli, Commands};
use mediagraph::commands;
use mediagraph::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { session, .. } => {
            if let Some(id) = &session {
                tracing::debug!("Opening session: {}", id);
            }
            commands::chat::run_chat(config, session).await?;
            Ok(())
        }
        Commands::Ask {
            query,
            session,
            json,
        } => {
            tracing::info!("Sending one-shot query");
            commands::ask::run_ask(&config, &query, session.as_deref(), json).await?;
            Ok(())
        }
        Commands::Sessions { command } => {
            tracing::info!("Starting sessions command");
            commands::sessions::handle_sessions(&config, command).await?;
            Ok(())
        }
        Commands::Health { json } => {
            commands::health::run_health(&config, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so `--json` command output stays parseable.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose {
        "mediagraph=debug"
    } else {
        "mediagraph=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}
