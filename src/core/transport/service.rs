//! Transport service - orchestrates different transport types.
//!
//! This service provides a unified interface for binding the MCP server to
//! one of the compiled-in transports.

use tracing::info;

use super::{TransportConfig, TransportResult};
use crate::core::McpServer;

#[cfg(feature = "stdio")]
use super::stdio::StdioTransport;

#[cfg(feature = "tcp")]
use super::tcp::TcpTransport;

#[cfg(feature = "http")]
use super::http::HttpTransport;

/// Transport service - manages the transport layer for the MCP server.
#[derive(Debug, Clone)]
pub struct TransportService {
    config: TransportConfig,
}

impl TransportService {
    /// Create a new transport service with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Run the transport until it ends or the server's shutdown token fires.
    ///
    /// Called by [`McpServer::serve`], which owns the lifecycle transitions.
    pub(crate) async fn run(self, server: McpServer) -> TransportResult<()> {
        info!("Starting transport: {}", self.config.description());

        match self.config {
            #[cfg(feature = "stdio")]
            TransportConfig::Stdio => StdioTransport::run(server).await,
            #[cfg(feature = "tcp")]
            TransportConfig::Tcp(cfg) => TcpTransport::new(cfg).run(server).await,
            #[cfg(feature = "http")]
            TransportConfig::Http(cfg) => HttpTransport::new(cfg).run(server).await,
        }
    }
}
