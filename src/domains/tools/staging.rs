//! Static tool registration.
//!
//! Each tool file exports a registrar, a plain `fn(&StagingRegistry)`, that
//! builds one instance of the tool and announces it. The build's top level
//! lists every registrar once (`definitions::REGISTRARS`), and
//! [`stage_tools`] runs them all against a fresh [`StagingRegistry`] before
//! any server exists. Registrars may run in any order, and from several
//! threads at once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};

use super::RegistryError;
use super::registry::ToolRegistry;
use super::tool::Tool;
use crate::core::{Error, Result};

/// Builds a single tool instance.
pub type ToolFactory = fn() -> Arc<dyn Tool>;

/// Registers one tool implementation with a staging registry.
pub type Registrar = fn(&StagingRegistry) -> std::result::Result<(), RegistryError>;

/// Thread-safe registry that tools announce themselves to at startup.
///
/// The name check and the insertion happen under one lock, so two
/// concurrent registrations of the same name cannot both succeed.
#[derive(Debug, Default)]
pub struct StagingRegistry {
    inner: Mutex<ToolRegistry>,
}

impl StagingRegistry {
    /// Create an empty staging registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tool with `factory` and stage it under `name`.
    ///
    /// The factory runs exactly once, outside the lock. The tool must report
    /// `name` as its own name.
    pub fn register_factory(
        &self,
        name: &str,
        factory: ToolFactory,
    ) -> std::result::Result<(), RegistryError> {
        let tool = factory();
        if tool.name() != name {
            return Err(RegistryError::NameMismatch {
                registered: name.to_string(),
                declared: tool.name().to_string(),
            });
        }
        self.register(tool)
    }

    /// Stage an already-built tool.
    pub fn register(&self, tool: Arc<dyn Tool>) -> std::result::Result<(), RegistryError> {
        let name = tool.name().to_string();
        self.lock().register(tool)?;
        debug!("Staged tool: {}", name);
        Ok(())
    }

    /// Snapshot of every staged tool, sorted by name.
    pub fn snapshot(&self) -> Vec<Arc<dyn Tool>> {
        self.lock().list()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A registrar that panicked mid-call cannot leave the map half-written,
    // so a poisoned lock is still safe to read.
    fn lock(&self) -> MutexGuard<'_, ToolRegistry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run every registrar against a fresh staging registry.
///
/// All registrars run even after one fails, so the returned
/// [`Error::Registration`] names every conflicting tool at once.
pub fn stage_tools(registrars: &[Registrar]) -> Result<StagingRegistry> {
    let staging = StagingRegistry::new();

    let failures: Vec<RegistryError> = registrars
        .iter()
        .filter_map(|register| register(&staging).err())
        .collect();

    if !failures.is_empty() {
        for failure in &failures {
            error!("Tool registration failed: {}", failure);
        }
        return Err(Error::Registration(failures));
    }

    Ok(staging)
}
