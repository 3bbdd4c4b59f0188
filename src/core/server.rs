//! MCP Server implementation and lifecycle management.
//!
//! This module contains the dispatch server: it owns a frozen
//! [`ToolRegistry`], resolves inbound calls by name, validates their
//! arguments and runs the tool with panic isolation. Every call produces a
//! [`ToolOutput`]; nothing a tool does can take the serving loop down.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool.
//! Each file exports a registrar; the entry point stages all of them and
//! hands the staging registry to [`McpServer::new`].
//! **Adding a new tool does NOT require modifying this file!**
//!
//! ## Lifecycle
//!
//! `Uninitialized -> Constructing -> Ready -> Serving -> Stopped`. The
//! registry is only written while constructing; once `Ready` it is shared
//! read-only between clones of the server and calls need no locking.
//! Construction is synchronous, so [`McpServer::state`] starts at `Ready`.
//!
//! Stopping rejects new calls but lets running ones finish: every dispatch
//! holds a token on the server's in-flight tracker, and transports wait on
//! [`McpServer::wait_for_in_flight`] before closing their sessions.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam,
        ServerCapabilities, ServerInfo, Tool as McpTool,
    },
    service::RequestContext,
};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, warn};

use super::config::Config;
use super::error::{Error, Result};
use super::transport::TransportService;
use crate::domains::tools::{
    Arguments, CallContext, StagingRegistry, Tool, ToolError, ToolOutput, ToolRegistry,
};

// ============================================================================
// Server State
// ============================================================================

/// Lifecycle state of a server instance.
///
/// `Uninitialized` and `Constructing` only exist inside
/// [`McpServer::from_tools`]; a server value is always at least `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    Uninitialized = 0,
    Constructing = 1,
    Ready = 2,
    Serving = 3,
    Stopped = 4,
}

impl ServerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Uninitialized,
            1 => Self::Constructing,
            2 => Self::Ready,
            3 => Self::Serving,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Constructing => "constructing",
            Self::Ready => "ready",
            Self::Serving => "serving",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Dispatch Server
// ============================================================================

/// The main MCP server handler.
///
/// Cheap to clone: clones share the registry, the lifecycle state and the
/// shutdown signal.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tools owned by this server, frozen after construction.
    registry: Arc<ToolRegistry>,

    /// Current [`ServerState`], shared between clones.
    state: Arc<AtomicU8>,

    /// Cancelled by [`McpServer::stop`]; transports watch it.
    shutdown: CancellationToken,

    /// One token per running dispatch; closed by [`McpServer::stop`].
    in_flight: TaskTracker,
}

impl McpServer {
    /// Create a server exposing every tool in the staging registry.
    pub fn new(config: Config, staging: &StagingRegistry) -> Result<Self> {
        Self::from_tools(config, staging.snapshot())
    }

    /// Create a server exposing the given tools.
    ///
    /// Every tool is registered into a fresh registry owned by this server.
    /// If any registration fails, all failures are reported together and no
    /// server is built.
    pub fn from_tools<I>(config: Config, tools: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        debug!("Constructing server '{}'", config.server.name);

        let mut registry = ToolRegistry::new();
        let failures: Vec<_> = tools
            .into_iter()
            .filter_map(|tool| registry.register(tool).err())
            .collect();

        if !failures.is_empty() {
            for failure in &failures {
                error!("Failed to register tool with server: {}", failure);
            }
            return Err(Error::Registration(failures));
        }

        info!(
            "Server '{}' ready with {} tool(s)",
            config.server.name,
            registry.len()
        );

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            state: Arc::new(AtomicU8::new(ServerState::Ready as u8)),
            shutdown: CancellationToken::new(),
            in_flight: TaskTracker::new(),
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Token cancelled when the server stops.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// List all registered tools, sorted by name.
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.registry.list()
    }

    /// Look up a registered tool by name.
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.registry.get(name)
    }

    /// Names of all registered tools, sorted.
    pub fn tool_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// MCP metadata of every registered tool.
    pub fn tool_models(&self) -> Vec<McpTool> {
        self.registry.list().iter().map(|t| t.to_tool()).collect()
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Resolve and run a tool call.
    ///
    /// Unknown names, schema violations, a stopped server and panics inside
    /// the tool all come back as [`ToolOutput::Failure`]. Whatever the tool
    /// itself returns is passed through unchanged.
    #[instrument(skip(self, arguments, context))]
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: &Arguments,
        context: &CallContext,
    ) -> ToolOutput {
        // Taken before the state check so stop() cannot miss this call
        let _in_flight = self.in_flight.token();

        if self.state() == ServerState::Stopped {
            warn!("Rejecting call to '{}': server is stopped", name);
            return ToolError::Stopped(name.to_string()).into();
        }

        let Some(tool) = self.registry.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return ToolError::not_found(name).into();
        };

        if let Err(e) = tool.schema().validate(arguments) {
            warn!("Rejected call to '{}': {}", name, e);
            return e.into();
        }

        match AssertUnwindSafe(tool.execute(context, arguments))
            .catch_unwind()
            .await
        {
            Ok(output) => {
                debug!("Tool '{}' finished (success: {})", name, output.is_success());
                output
            }
            Err(payload) => {
                let reason = panic_message(&*payload);
                error!("Tool '{}' panicked: {}", name, reason);
                ToolError::Panicked {
                    name: name.to_string(),
                    reason,
                }
                .into()
            }
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Serve calls over the given transport until it ends or [`stop`] is called.
    ///
    /// Only valid from [`ServerState::Ready`]. The server is `Stopped` when
    /// this returns, whether the transport ended cleanly or not.
    ///
    /// [`stop`]: McpServer::stop
    pub async fn serve(&self, transport: TransportService) -> Result<()> {
        if let Err(actual) = self.state.compare_exchange(
            ServerState::Ready as u8,
            ServerState::Serving as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            return Err(Error::InvalidState {
                action: "serve",
                state: ServerState::from_u8(actual),
            });
        }

        info!("Serving {} v{}", self.name(), self.version());
        let result = transport.run(self.clone()).await;
        self.stop();
        self.wait_for_in_flight().await;

        result.map_err(Error::from)
    }

    /// Stop accepting calls and release the transport.
    ///
    /// Calls already running are left to finish. Idempotent.
    pub fn stop(&self) {
        let previous = self.state.swap(ServerState::Stopped as u8, Ordering::SeqCst);
        if previous != ServerState::Stopped as u8 {
            info!("Server stopped (was {})", ServerState::from_u8(previous));
        }
        self.in_flight.close();
        self.shutdown.cancel();
    }

    /// Wait until every call started before [`stop`] has returned.
    ///
    /// Only completes once the server is stopped.
    ///
    /// [`stop`]: McpServer::stop
    pub async fn wait_for_in_flight(&self) {
        self.in_flight.wait().await;
    }
}

impl fmt::Debug for McpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpServer")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("registry", &self.registry)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// MCP protocol binding
// ============================================================================

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo {
            instructions: Some(format!(
                "{} exposes {} tool(s). Call tools/list to discover them.",
                self.name(),
                self.registry.len()
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        };
        info.server_info.name = self.name().to_string();
        info.server_info.version = self.version().to_string();
        info
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.tool_models(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip_all, fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("Calling tool: {}", request.name);
        let arguments = request.arguments.unwrap_or_default();
        let call_context = CallContext::with_cancellation(context.ct.clone());

        let output = self.dispatch(&request.name, &arguments, &call_context).await;
        Ok(output.into_call_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TransportConfig;
    use crate::domains::tools::{ParamSpec, ParameterSchema, RegistryError};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Echoes `message`; counts how often its body actually ran.
    struct EchoTool {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo a message"
        }

        fn schema(&self) -> ParameterSchema {
            ParameterSchema::new().with(ParamSpec::string("message").required())
        }

        async fn execute(&self, _context: &CallContext, arguments: &Arguments) -> ToolOutput {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match arguments.get("message").and_then(|v| v.as_str()) {
                Some("fail") => ToolOutput::failure("asked to fail"),
                Some(message) => ToolOutput::success(message),
                None => ToolOutput::failure("missing message"),
            }
        }
    }

    struct PanickingTool;

    #[async_trait::async_trait]
    impl Tool for PanickingTool {
        fn name(&self) -> &str {
            "explode"
        }

        fn description(&self) -> &str {
            "Always panics"
        }

        fn schema(&self) -> ParameterSchema {
            ParameterSchema::new()
        }

        async fn execute(&self, _context: &CallContext, _arguments: &Arguments) -> ToolOutput {
            panic!("kaboom")
        }
    }

    /// Signals once it started, then takes a while to answer.
    struct SlowTool {
        started: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Answers after a short delay"
        }

        fn schema(&self) -> ParameterSchema {
            ParameterSchema::new()
        }

        async fn execute(&self, context: &CallContext, _arguments: &Arguments) -> ToolOutput {
            self.started.notify_one();
            tokio::time::sleep(Duration::from_millis(100)).await;
            if context.is_cancelled() {
                ToolOutput::failure("saw cancellation")
            } else {
                ToolOutput::success("done")
            }
        }
    }

    fn test_server() -> (McpServer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(EchoTool {
                calls: Arc::clone(&calls),
            }),
            Arc::new(PanickingTool),
        ];
        let server = McpServer::from_tools(Config::default(), tools).unwrap();
        (server, calls)
    }

    fn args(value: serde_json::Value) -> Arguments {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_construction_reaches_ready() {
        let (server, _) = test_server();
        assert_eq!(server.state(), ServerState::Ready);
        assert_eq!(server.tool_names(), vec!["echo", "explode"]);
        assert!(server.get_tool("echo").is_some());
        assert!(server.get_tool("nope").is_none());
    }

    #[test]
    fn test_construction_aggregates_conflicts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(EchoTool {
                calls: Arc::clone(&calls),
            }),
            Arc::new(EchoTool {
                calls: Arc::clone(&calls),
            }),
            Arc::new(PanickingTool),
            Arc::new(PanickingTool),
        ];

        match McpServer::from_tools(Config::default(), tools) {
            Err(Error::Registration(failures)) => {
                assert_eq!(
                    failures,
                    vec![
                        RegistryError::conflict("echo"),
                        RegistryError::conflict("explode")
                    ]
                );
            }
            Err(other) => panic!("Expected registration error, got {other}"),
            Ok(_) => panic!("Expected registration error"),
        }
    }

    #[test]
    fn test_new_copies_staging_registry() {
        let staging = StagingRegistry::new();
        staging.register(Arc::new(PanickingTool)).unwrap();

        let server = McpServer::new(Config::default(), &staging).unwrap();
        assert_eq!(server.list_tools().len(), staging.len());
        assert!(server.get_tool("explode").is_some());
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let (server, calls) = test_server();
        let output = server
            .dispatch("echo", &args(json!({ "message": "hi" })), &CallContext::new())
            .await;
        assert_eq!(output, ToolOutput::success("hi"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_passes_tool_failure_through() {
        let (server, _) = test_server();
        let output = server
            .dispatch("echo", &args(json!({ "message": "fail" })), &CallContext::new())
            .await;
        assert_eq!(output, ToolOutput::failure("asked to fail"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let (server, _) = test_server();
        let before = server.tool_names().len();

        let output = server
            .dispatch("does_not_exist", &Arguments::new(), &CallContext::new())
            .await;

        assert!(output.is_failure());
        assert!(output.text().contains("does_not_exist"));
        assert_eq!(server.tool_names().len(), before);
        assert_eq!(server.state(), ServerState::Ready);
    }

    #[tokio::test]
    async fn test_dispatch_missing_parameter_skips_tool() {
        let (server, calls) = test_server();
        let output = server
            .dispatch("echo", &Arguments::new(), &CallContext::new())
            .await;

        assert!(output.is_failure());
        assert!(output.text().contains("message"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_wrong_type_skips_tool() {
        let (server, calls) = test_server();
        let output = server
            .dispatch("echo", &args(json!({ "message": 42 })), &CallContext::new())
            .await;

        assert!(output.is_failure());
        assert!(output.text().contains("'message'"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_isolates_panics() {
        let (server, _) = test_server();
        let output = server
            .dispatch("explode", &Arguments::new(), &CallContext::new())
            .await;

        assert!(output.is_failure());
        assert!(output.text().contains("explode"));
        assert!(output.text().contains("kaboom"));

        // The server keeps working after a tool panicked
        let output = server
            .dispatch("echo", &args(json!({ "message": "still here" })), &CallContext::new())
            .await;
        assert_eq!(output.text(), "still here");
    }

    #[tokio::test]
    async fn test_concurrent_dispatch() {
        let (server, calls) = test_server();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let server = server.clone();
                tokio::spawn(async move {
                    let message = format!("call {i}");
                    let output = server
                        .dispatch("echo", &args(json!({ "message": message })), &CallContext::new())
                        .await;
                    (message, output)
                })
            })
            .collect();

        for handle in handles {
            let (message, output) = handle.await.unwrap();
            assert_eq!(output.text(), message);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_stop_rejects_calls() {
        let (server, calls) = test_server();
        let clone = server.clone();
        server.stop();

        assert_eq!(clone.state(), ServerState::Stopped);
        assert!(clone.shutdown_token().is_cancelled());

        let output = clone
            .dispatch("echo", &args(json!({ "message": "hi" })), &CallContext::new())
            .await;
        assert!(output.is_failure());
        assert!(output.text().contains("stopped"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_lets_running_calls_finish() {
        let started = Arc::new(Notify::new());
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(SlowTool {
            started: Arc::clone(&started),
        })];
        let server = McpServer::from_tools(Config::default(), tools).unwrap();

        let running = {
            let server = server.clone();
            tokio::spawn(async move {
                server
                    .dispatch("slow", &Arguments::new(), &CallContext::new())
                    .await
            })
        };

        started.notified().await;
        server.stop();

        tokio::time::timeout(Duration::from_secs(5), server.wait_for_in_flight())
            .await
            .expect("in-flight call never finished");
        assert_eq!(running.await.unwrap(), ToolOutput::success("done"));
    }

    #[tokio::test]
    async fn test_serve_after_stop_is_rejected() {
        let (server, _) = test_server();
        server.stop();

        let result = server
            .serve(TransportService::new(TransportConfig::default()))
            .await;
        assert!(matches!(
            result,
            Err(Error::InvalidState {
                state: ServerState::Stopped,
                ..
            })
        ));
    }

    #[test]
    fn test_tool_models() {
        let (server, _) = test_server();
        let models = server.tool_models();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "echo");
        assert_eq!(models[0].input_schema["required"], json!(["message"]));
    }

    #[test]
    fn test_server_info() {
        let (server, _) = test_server();
        let info = server.get_info();
        assert_eq!(info.server_info.name, "cogito");
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ServerState::Serving.to_string(), "serving");
        assert_eq!(ServerState::from_u8(ServerState::Ready as u8), ServerState::Ready);
    }
}
