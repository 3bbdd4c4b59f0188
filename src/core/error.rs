//! Error types and handling for the MCP server.
//!
//! This module defines the fatal error type of the server: failures that
//! stop it from starting or serving. Per-call problems never show up here;
//! they are returned to the caller as a failure
//! [`ToolOutput`](crate::domains::tools::ToolOutput).

use thiserror::Error;

use super::server::ServerState;
use super::transport::TransportError;
use crate::domains::tools::RegistryError;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more tools could not be registered.
    ///
    /// Always a build mistake (two tools sharing a name, a factory producing
    /// the wrong tool). Every offending registration is listed.
    #[error("Tool registration failed: {}", describe_failures(.0))]
    Registration(Vec<RegistryError>),

    /// A lifecycle operation was attempted in the wrong state.
    #[error("Invalid server state: cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: ServerState,
    },

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transport could not be started or failed while serving.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

fn describe_failures(failures: &[RegistryError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
