//! Configuration management for MediaGraph
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{MediaGraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for MediaGraph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Chat controller behavior
    #[serde(default)]
    pub chat: ChatConfig,
    /// Terminal rendering settings
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the MediaGraph backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("mediagraph/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Chat controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Allocate a backend session as soon as a new chat is started,
    /// instead of lazily on the first query
    #[serde(default = "default_true")]
    pub eager_session: bool,

    /// Abandon in-flight calls as soon as their conversation is deleted
    #[serde(default = "default_true")]
    pub cancel_on_delete: bool,

    /// Fetch the session list when the interactive chat starts
    #[serde(default = "default_true")]
    pub load_history_on_start: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            eager_session: true,
            cancel_on_delete: true,
            load_history_on_start: true,
        }
    }
}

/// Terminal rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Show detected label and result count under assistant replies
    #[serde(default = "default_true")]
    pub show_metadata: bool,

    /// Titles longer than this are truncated in listings
    #[serde(default = "default_max_title_width")]
    pub max_title_width: usize,
}

fn default_max_title_width() -> usize {
    40
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_metadata: true,
            max_title_width: default_max_title_width(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed command line, for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(MediaGraphError::from)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(MediaGraphError::from)?;
        tracing::debug!("Loaded configuration from {}", path);
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("MEDIAGRAPH_API_BASE_URL") {
            tracing::debug!(base_url = %base_url, "Env override: MEDIAGRAPH_API_BASE_URL");
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("MEDIAGRAPH_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid MEDIAGRAPH_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(eager) = std::env::var("MEDIAGRAPH_EAGER_SESSION") {
            match eager.parse::<bool>() {
                Ok(v) => {
                    self.chat.eager_session = v;
                    tracing::debug!(eager_session = v, "Env override: MEDIAGRAPH_EAGER_SESSION");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for MEDIAGRAPH_EAGER_SESSION: {}", eager);
                }
            }
        }

        if let Ok(cancel) = std::env::var("MEDIAGRAPH_CANCEL_ON_DELETE") {
            match cancel.parse::<bool>() {
                Ok(v) => {
                    self.chat.cancel_on_delete = v;
                    tracing::debug!(
                        cancel_on_delete = v,
                        "Env override: MEDIAGRAPH_CANCEL_ON_DELETE"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for MEDIAGRAPH_CANCEL_ON_DELETE: {}",
                        cancel
                    );
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            self.api.base_url = base_url.clone();
        }
        if let crate::cli::Commands::Chat {
            no_history: true, ..
        } = cli.command
        {
            self.chat.load_history_on_start = false;
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not an http(s) URL or a numeric
    /// setting is out of range
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            MediaGraphError::Config(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(MediaGraphError::Config(format!(
                "api.base_url must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(MediaGraphError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.timeout_seconds > 600 {
            return Err(MediaGraphError::Config(
                "api.timeout_seconds must be less than or equal to 600".to_string(),
            )
            .into());
        }

        if self.display.max_title_width < 8 {
            return Err(MediaGraphError::Config(
                "display.max_title_width must be at least 8".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
