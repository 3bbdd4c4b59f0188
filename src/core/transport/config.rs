//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Which transport the server binds to, and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Line-delimited JSON-RPC over stdin/stdout (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// JSON-RPC over TCP, one MCP session per connection.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// JSON-RPC over HTTP POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// TCP transport configuration.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Port number to listen on. `0` picks a free port.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on. `0` picks a free port.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path of the JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable permissive CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn env_port(var: &str, fallback: u16) -> u16 {
    std::env::var(var)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(fallback)
}

#[cfg(feature = "tcp")]
impl TcpConfig {
    /// `host:port` string to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn from_env() -> Self {
        Self {
            port: env_port("MCP_TCP_PORT", 3000),
            host: std::env::var("MCP_TCP_HOST").unwrap_or_else(|_| default_host()),
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    /// `host:port` string to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn from_env() -> Self {
        Self {
            port: env_port("MCP_HTTP_PORT", 8080),
            host: std::env::var("MCP_HTTP_HOST").unwrap_or_else(|_| default_host()),
            rpc_path: std::env::var("MCP_HTTP_PATH").unwrap_or_else(|_| default_rpc_path()),
            enable_cors: std::env::var("MCP_HTTP_CORS")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
        {
            return Self::Tcp(TcpConfig::default());
        }

        #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio, tcp, or http");
        }
    }
}

impl TransportConfig {
    /// Load transport config from environment variables.
    ///
    /// `MCP_TRANSPORT` selects `stdio`, `tcp` or `http`; anything else (or
    /// a transport whose feature is not compiled in) falls back to the
    /// default transport.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "tcp")]
            "tcp" => Self::Tcp(TcpConfig::from_env()),
            #[cfg(feature = "http")]
            "http" => Self::Http(HttpConfig::from_env()),
            _ => Self::default(),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}", cfg.address()),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}{}", cfg.address(), cfg.rpc_path),
        }
    }
}
