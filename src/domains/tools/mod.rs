//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients to perform
//! specific actions or computations.
//!
//! ## Architecture
//!
//! - `tool.rs` - The [`Tool`] contract, call context and [`ToolOutput`]
//! - `schema.rs` - Declarative parameter schemas and argument validation
//! - `registry.rs` - Name to tool map enforcing unique names
//! - `staging.rs` - Thread-safe staging registry filled by registrars at startup
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `error.rs` - Tool-specific error types
//!
//! **No need to modify `server.rs` to add a tool!** See `definitions/mod.rs`.

pub mod definitions;
mod error;
mod registry;
pub mod schema;
mod staging;
mod tool;

pub use error::{RegistryError, ToolError};
pub use registry::ToolRegistry;
pub use schema::{ParamKind, ParamSpec, ParameterSchema};
pub use staging::{Registrar, StagingRegistry, ToolFactory, stage_tools};
pub use tool::{Arguments, CallContext, Tool, ToolOutput};
