use std::collections::HashMap;

use palaver_core::error::{PalaverError, Result};
use palaver_core::traits::ToolBinding;
use palaver_core::types::Payload;

/// Registry of named tools available to the chat host.
///
/// Distinct from the workflow registry's per-node bindings: these are
/// looked up by tool name, not node id.
pub struct ToolRegistry {
    tools: HashMap<String, ToolBinding>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Overwrites any prior binding with the name.
    pub fn register(&mut self, name: impl Into<String>, binding: ToolBinding) {
        self.tools.insert(name.into(), binding);
    }

    /// Unregister a tool by name.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolBinding> {
        self.tools.get(name)
    }

    /// List registered tool names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, input: Payload) -> Result<Payload> {
        let tool = self
            .get(name)
            .ok_or_else(|| PalaverError::ToolNotFound(name.to_string()))?;
        tool.call(input).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(
            "double",
            ToolBinding::sync(|input| {
                let n = input.as_i64().unwrap_or(0);
                Ok(json!(n * 2))
            }),
        );

        let out = registry.execute("double", json!(21)).await.unwrap();
        assert_eq!(out, json!(42));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.execute("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, PalaverError::ToolNotFound(_)));
    }

    #[test]
    fn test_list_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register("b_tool", ToolBinding::sync(|input| Ok(input)));
        registry.register("a_tool", ToolBinding::sync(|input| Ok(input)));
        assert_eq!(registry.list(), vec!["a_tool", "b_tool"]);
    }
}
