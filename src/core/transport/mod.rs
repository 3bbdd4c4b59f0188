//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **STDIO**: Standard input/output (default for MCP) - feature: `stdio`
//! - **TCP**: Raw TCP socket with JSON-RPC messages - feature: `tcp`
//! - **HTTP**: HTTP server with JSON-RPC over POST requests - feature: `http`
//!
//! Each transport only frames messages: every tool call is handed to
//! [`McpServer`](crate::core::McpServer) for dispatch. All transports stop
//! when the server's shutdown token is cancelled, after the calls they
//! already accepted have finished.

mod config;
mod error;
mod service;

#[cfg(any(feature = "stdio", feature = "tcp"))]
mod session;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "tcp")]
pub use config::TcpConfig;

#[cfg(feature = "http")]
pub use config::HttpConfig;
