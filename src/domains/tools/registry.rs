//! Tool Registry - name to tool ownership map.
//!
//! This module provides:
//! - Name uniqueness: a second registration under a taken name is rejected
//! - O(1) lookup by name for dispatch
//! - Snapshots of all tools for listing
//!
//! A registry is a plain value with no interior locking. The server freezes
//! its copy behind an `Arc` once built; the thread-safe staging variant lives
//! in `staging.rs`.

use std::collections::HashMap;
use std::sync::Arc;

use super::RegistryError;
use super::tool::Tool;

// ============================================================================
// Tool Registry
// ============================================================================

/// Registry mapping unique names to tool instances.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name.
    ///
    /// Fails with [`RegistryError::NameConflict`] if the name is taken; the
    /// existing entry is left untouched.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.tools.contains_key(name) {
            return Err(RegistryError::conflict(name));
        }
        self.tools.insert(name.to_string(), tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All registered tools, sorted by name.
    ///
    /// The order is for deterministic output only; callers must not rely on it.
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<_> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    /// All tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domains::tools::{Arguments, CallContext, ParameterSchema, ToolOutput};

    /// Minimal tool used across the tools domain tests.
    pub(crate) struct NamedTool {
        pub name: String,
        pub reply: String,
    }

    impl NamedTool {
        pub(crate) fn arc(name: &str, reply: &str) -> Arc<dyn Tool> {
            Arc::new(Self {
                name: name.to_string(),
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait::async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "Replies with a fixed string"
        }

        fn schema(&self) -> ParameterSchema {
            ParameterSchema::new()
        }

        async fn execute(&self, _context: &CallContext, _arguments: &Arguments) -> ToolOutput {
            ToolOutput::success(self.reply.clone())
        }
    }

    #[test]
    fn test_registry_new_empty() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.list().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(NamedTool::arc("echo", "first")).unwrap();

        let err = registry.register(NamedTool::arc("echo", "second")).unwrap_err();
        assert_eq!(err, RegistryError::conflict("echo"));
        assert_eq!(registry.len(), 1);

        // The first registration is still the one served
        let tool = registry.get("echo").expect("tool must exist");
        let output = tool.execute(&CallContext::new(), &Arguments::new()).await;
        assert_eq!(output.text(), "first");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = ToolRegistry::new();
        let err = registry.register(NamedTool::arc("", "x")).unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_returns_every_registered_tool() {
        let mut registry = ToolRegistry::new();
        for name in ["gamma", "alpha", "beta"] {
            registry.register(NamedTool::arc(name, name)).unwrap();
        }

        let tools = registry.list();
        assert_eq!(tools.len(), 3);
        for tool in &tools {
            assert!(registry.get(tool.name()).is_some());
        }
        assert_eq!(registry.names(), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_lookups_are_idempotent() {
        let mut registry = ToolRegistry::new();
        registry.register(NamedTool::arc("a", "1")).unwrap();
        registry.register(NamedTool::arc("b", "2")).unwrap();

        let first: Vec<_> = registry.list().iter().map(|t| t.name().to_string()).collect();
        let second: Vec<_> = registry.list().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(first, second);

        let a1 = registry.get("a").unwrap();
        let a2 = registry.get("a").unwrap();
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(registry.get("c").is_none());
        assert!(!registry.contains("c"));
    }
}
