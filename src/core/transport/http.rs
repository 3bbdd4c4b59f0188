//! HTTP transport implementation.
//!
//! HTTP server with JSON-RPC over POST requests.
//! This allows standard HTTP clients (curl, browsers, etc.) to list and call
//! tools. Requests are stateless: every POST carries one JSON-RPC message.
//! Stopping the server lets requests that are already running complete;
//! axum's graceful shutdown waits for them.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, instrument, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::domains::tools::CallContext;

/// MCP protocol revision advertised by `initialize`.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, -32601, format!("Method not found: {}", method))
    }

    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    pub fn internal_error(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32603, msg)
    }
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
struct AppState {
    server: McpServer,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Build the axum router serving `server`.
    pub fn router(&self, server: McpServer) -> Router {
        let app = Router::new()
            .route(&self.config.rpc_path, post(handle_rpc))
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .with_state(AppState { server });

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app.layer(cors)
        } else {
            app
        }
    }

    /// Run the HTTP transport until the server is stopped.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.config.address();
        let shutdown = server.shutdown_token();
        let app = self.router(server);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        info!("HTTP transport finished");
        Ok(())
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "tools": state.server.tool_names(),
        "protocol": "JSON-RPC 2.0",
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "state": state.server.state().to_string(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Handle JSON-RPC requests.
#[instrument(skip_all, fields(method))]
async fn handle_rpc(
    State(state): State<AppState>,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    tracing::Span::current().record("method", request.method.as_str());
    info!("Received JSON-RPC request: {}", request.method);

    match process_request(&state, request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Process a JSON-RPC request.
///
/// Returns `None` for notifications, which get no JSON-RPC response.
async fn process_request(state: &AppState, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::invalid_request(request.id));
    }

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(state, request),
        "ping" => JsonRpcResponse::success(request.id, json!({})),
        "tools/list" => handle_tools_list(state, request),
        "tools/call" => handle_tools_call(state, request).await,

        method if method.starts_with("notifications/") => {
            info!("Received notification: {}", method);
            return None;
        }

        method => {
            warn!("Unknown method: {}", method);
            JsonRpcResponse::method_not_found(request.id, method)
        }
    };

    Some(response)
}

/// Handle initialize request.
fn handle_initialize(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let result = json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": state.server.name(),
            "version": state.server.version()
        }
    });

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/list request.
fn handle_tools_list(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    match serde_json::to_value(state.server.tool_models()) {
        Ok(tools) => JsonRpcResponse::success(request.id, json!({ "tools": tools })),
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}

/// Handle tools/call request.
///
/// Only a malformed envelope is a JSON-RPC error. Anything that goes wrong
/// with the call itself, including an unknown tool name, is a successful
/// response carrying a result with `isError: true`.
async fn handle_tools_call(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let Some(params) = request.params else {
        return JsonRpcResponse::invalid_params(request.id, "Missing params");
    };

    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::invalid_params(request.id, "Missing tool name");
    };

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return JsonRpcResponse::invalid_params(request.id, "Arguments must be an object");
        }
    };

    // Not tied to the shutdown token: a stop must not cancel accepted calls
    let context = CallContext::new();
    let output = state.server.dispatch(name, &arguments, &context).await;

    match serde_json::to_value(output.into_call_result()) {
        Ok(result) => JsonRpcResponse::success(request.id, result),
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}
