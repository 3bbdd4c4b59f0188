//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.

use tracing::info;

use super::TransportResult;
use super::session::run_session;
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport.
    ///
    /// Returns when the client closes stdin, or once the server is stopped
    /// and its running calls have finished.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        let reason = run_session(server, rmcp::transport::stdio()).await?;

        info!("STDIO transport finished: {:?}", reason);
        Ok(())
    }
}
