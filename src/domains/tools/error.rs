//! Tool-specific error types.

use thiserror::Error;

/// Errors raised while resolving or validating a tool call.
///
/// None of these escape the dispatch layer: they are rendered into a
/// failure [`ToolOutput`](super::ToolOutput) and handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The requested tool is not registered.
    #[error("unknown tool: {0}")]
    NotFound(String),

    /// A required parameter is absent from the argument bundle.
    #[error("missing required parameter '{0}'")]
    MissingArgument(String),

    /// A parameter is present but has the wrong type.
    #[error("invalid type for parameter '{name}': expected {expected}")]
    InvalidArgument { name: String, expected: String },

    /// A parameter value lies outside its declared set of allowed values.
    #[error("unsupported value '{value}' for parameter '{name}' (expected one of: {allowed})")]
    UnsupportedValue {
        name: String,
        value: String,
        allowed: String,
    },

    /// The call was cancelled or its deadline passed.
    #[error("call to '{0}' was cancelled")]
    Cancelled(String),

    /// The server no longer accepts calls.
    #[error("server is stopped; call to '{0}' rejected")]
    Stopped(String),

    /// The tool panicked while executing.
    #[error("tool '{name}' failed unexpectedly: {reason}")]
    Panicked { name: String, reason: String },
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "missing argument" error.
    pub fn missing_argument(name: impl Into<String>) -> Self {
        Self::MissingArgument(name.into())
    }

    /// Create a new "invalid argument" error.
    pub fn invalid_argument(name: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            expected: expected.into(),
        }
    }

    /// Create a new "unsupported value" error.
    pub fn unsupported_value(name: impl Into<String>, value: impl Into<String>, allowed: &[String]) -> Self {
        Self::UnsupportedValue {
            name: name.into(),
            value: value.into(),
            allowed: allowed.join(", "),
        }
    }
}

/// Errors raised while building a registry.
///
/// These are configuration mistakes: two linked tools claiming the same
/// name, or a factory producing a tool other than the one it announced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("tool '{name}' is already registered")]
    NameConflict { name: String },

    /// A factory registered under one name produced a tool with another.
    #[error("tool registered as '{registered}' reports its name as '{declared}'")]
    NameMismatch { registered: String, declared: String },

    /// Tool names must be non-empty.
    #[error("tool name must not be empty")]
    EmptyName,
}

impl RegistryError {
    /// Create a new "name conflict" error.
    pub fn conflict(name: impl Into<String>) -> Self {
        Self::NameConflict { name: name.into() }
    }

    /// The tool name this error is about, if any.
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::NameConflict { name } => Some(name),
            Self::NameMismatch { registered, .. } => Some(registered),
            Self::EmptyName => None,
        }
    }
}
