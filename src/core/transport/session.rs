//! One rmcp session bound to the server lifecycle.
//!
//! The session's cancellation token is separate from the server's shutdown
//! token: on shutdown the session is only closed once every running call
//! has finished, so a stop never cancels work that was already accepted.

use rmcp::{
    RoleServer, ServiceExt,
    service::QuitReason,
    transport::IntoTransport,
};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// Time given to the responses of drained calls to reach the peer.
const FLUSH_GRACE: Duration = Duration::from_millis(100);

/// Serve `transport` until the peer disconnects or the server stops.
pub(crate) async fn run_session<T, E, A>(
    server: McpServer,
    transport: T,
) -> TransportResult<QuitReason>
where
    T: IntoTransport<RoleServer, E, A>,
    E: std::error::Error + Send + Sync + 'static,
{
    let session_ct = CancellationToken::new();

    let closer = {
        let server = server.clone();
        let session_ct = session_ct.clone();
        let shutdown = server.shutdown_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    server.wait_for_in_flight().await;
                    tokio::time::sleep(FLUSH_GRACE).await;
                    debug!("Running calls drained, closing session");
                    session_ct.cancel();
                }
                _ = session_ct.cancelled() => {}
            }
        })
    };

    let result = match server.serve_with_ct(transport, session_ct.clone()).await {
        Ok(service) => service
            .waiting()
            .await
            .map_err(|e| TransportError::service(e.to_string())),
        Err(e) => Err(TransportError::init(e.to_string())),
    };

    session_ct.cancel();
    let _ = closer.await;
    result
}
