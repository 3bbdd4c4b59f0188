//! Transport error types.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that stop a transport from starting or serving.
///
/// Problems with a single connection or request are logged and answered in
/// protocol; they never surface here.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The MCP session could not be initialized.
    #[error("Server initialization error: {0}")]
    InitError(String),

    /// The running MCP service failed.
    #[error("Service error: {0}")]
    ServiceError(String),

    /// HTTP server failure.
    #[error("HTTP error: {0}")]
    HttpError(String),
}

impl TransportError {
    /// Create a bind error.
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }

    /// Create an initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::InitError(msg.into())
    }

    /// Create a service error.
    pub fn service(msg: impl Into<String>) -> Self {
        Self::ServiceError(msg.into())
    }

    /// Create an HTTP error.
    pub fn http(msg: impl Into<String>) -> Self {
        Self::HttpError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_names_address() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        let err = TransportError::bind("127.0.0.1:3000", io);
        assert!(err.to_string().contains("127.0.0.1:3000"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
