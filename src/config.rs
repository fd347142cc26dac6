//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Arcade server configuration, loaded from TOML.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ArcadeConfig {
    /// SQLite database path.
    #[serde(default = "default_database_url")]
    database_url: String,

    /// Host to bind to.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind to.
    #[serde(default = "default_port")]
    port: u16,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    log_filter: String,

    /// Events buffered per subscriber before it starts lagging.
    #[serde(default = "default_event_capacity")]
    event_capacity: usize,

    /// Upper bound on bot moves after one human move.
    #[serde(default = "default_max_bot_steps")]
    max_bot_steps: usize,
}

fn default_database_url() -> String {
    "arcade.db".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_filter() -> String {
    "info,arcade=debug".to_string()
}

fn default_event_capacity() -> usize {
    64
}

fn default_max_bot_steps() -> usize {
    64
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            host: default_host(),
            port: default_port(),
            log_filter: default_log_filter(),
            event_capacity: default_event_capacity(),
            max_bot_steps: default_max_bot_steps(),
        }
    }
}

impl ArcadeConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on invalid TOML or a zero port.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        if config.port == 0 {
            return Err(ConfigError::new("Port must be non-zero"));
        }
        info!(database_url = %config.database_url, port = config.port, "Config loaded");
        Ok(config)
    }

    /// Loads `path` if given, otherwise the defaults; then applies the
    /// `DATABASE_URL` environment variable and explicit overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be loaded.
    #[instrument(skip(path))]
    pub fn resolve(
        path: Option<&Path>,
        database_url: Option<String>,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(url) = database_url {
            config.database_url = url;
        }
        if let Some(host) = host {
            config.host = host;
        }
        if let Some(port) = port {
            config.port = port;
        }
        Ok(config)
    }

    /// Socket address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
