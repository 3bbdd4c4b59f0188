//! Cogito MCP Server Library
//!
//! This crate provides a Model Context Protocol (MCP) server built around a
//! statically assembled tool registry and a dispatch core that turns every
//! call, including a panicking one, into a result value.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling, the dispatch server and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: the tool contract, parameter schemas, registries and the tool definitions
//!
//! # Example
//!
//! ```rust,no_run
//! use cogito_mcp::core::{Config, McpServer, TransportService};
//! use cogito_mcp::domains::tools::{definitions::REGISTRARS, stage_tools};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let staging = stage_tools(REGISTRARS)?;
//!     let server = McpServer::new(config.clone(), &staging)?;
//!     server.serve(TransportService::new(config.transport)).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result, ServerState};
