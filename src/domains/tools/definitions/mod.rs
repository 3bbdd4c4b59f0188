//! Tool definitions module.
//!
//! Each tool is defined in its own file and exports a `register` function.
//! [`REGISTRARS`] is the one place that lists them; the entry point stages
//! exactly this list.
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file here (e.g., `my_tool.rs`) implementing [`Tool`](super::Tool)
//! 2. Export a `register(&StagingRegistry)` function from it
//! 3. Add the module below and append its registrar to [`REGISTRARS`]

pub mod calculate;

pub use calculate::{CalculateError, CalculateParams, CalculateTool, Operation};

use super::Registrar;

/// Registrars of every tool linked into this build.
pub const REGISTRARS: &[Registrar] = &[calculate::register];
