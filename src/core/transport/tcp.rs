//! TCP transport implementation.
//!
//! Raw TCP socket transport with JSON-RPC messages (line-delimited). Each
//! accepted connection gets its own MCP session on its own task; all
//! sessions dispatch into the same server. On shutdown the listener closes
//! at once and each session closes after its running calls finish.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use super::session::run_session;
use super::{TransportError, TransportResult, config::TcpConfig};
use crate::core::McpServer;

/// TCP transport handler.
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    /// Create a new TCP transport with the given config.
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Run the TCP transport until the server is stopped.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.config.address();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let local = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or(addr);
        info!("Ready - listening on {} (JSON-RPC over TCP)", local);

        let shutdown = server.shutdown_token();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("TCP transport shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        info!("Accepted connection from {}", peer_addr);

                        // Set TCP_NODELAY to disable Nagle's algorithm
                        if let Err(e) = stream.set_nodelay(true) {
                            warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
                        }

                        let server = server.clone();
                        tokio::spawn(async move {
                            Self::handle_connection(server, stream, peer_addr).await;
                        });
                    }
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        // Small delay to avoid spinning on persistent errors
                        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    }
                }
            }
        }
    }

    /// Handle a single TCP connection.
    async fn handle_connection(server: McpServer, stream: TcpStream, peer_addr: SocketAddr) {
        info!("Client {} connected, serving...", peer_addr);
        match run_session(server, stream).await {
            Ok(reason) => info!("Client {} disconnected: {:?}", peer_addr, reason),
            Err(e) => warn!("Error while serving client {}: {}", peer_addr, e),
        }
    }
}
