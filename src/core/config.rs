//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, a `.env` file, or defaults.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
///
/// Descriptive only: reported to clients, never used for dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "cogito".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(version) = std::env::var("MCP_SERVER_VERSION") {
            config.server.version = version;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(timestamps) = std::env::var("MCP_LOG_TIMESTAMPS") {
            config.logging.with_timestamps = timestamps.parse().unwrap_or(true);
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();
        info!("Transport selected: {}", config.transport.description());

        config
    }

    /// Check the configuration for values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.name.trim().is_empty() {
            return Err(Error::config("server name must not be empty"));
        }
        if self.server.version.trim().is_empty() {
            return Err(Error::config("server version must not be empty"));
        }
        Ok(())
    }
}
