//! Built-in tools: clock helpers plus memory fact/note writers.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use palaver_core::error::PalaverError;
use palaver_core::traits::ToolBinding;
use palaver_core::types::Payload;
use palaver_memory::MemoryStore;

use crate::registry::ToolRegistry;

fn str_field(tool: &str, input: &Payload, key: &str) -> Result<String, PalaverError> {
    input
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| PalaverError::ToolExecution {
            tool: tool.to_string(),
            message: format!("missing required string field '{key}'"),
        })
}

impl ToolRegistry {
    /// Registry pre-populated with the built-in tools, wired to the
    /// given memory store.
    pub fn with_builtins(memory: Arc<MemoryStore>) -> Self {
        let mut registry = Self::new();

        registry.register(
            "current_time",
            ToolBinding::sync(|_input| {
                Ok(json!(chrono::Utc::now().format("%H:%M:%S").to_string()))
            }),
        );

        registry.register(
            "current_date",
            ToolBinding::sync(|_input| {
                Ok(json!(chrono::Utc::now().format("%Y-%m-%d").to_string()))
            }),
        );

        let store = memory.clone();
        registry.register(
            "remember_fact",
            ToolBinding::sync(move |input| {
                let key = str_field("remember_fact", &input, "key")?;
                let value = str_field("remember_fact", &input, "value")?;
                store.set_fact(&key, &value)?;
                debug!(%key, "remember_fact stored");
                Ok(json!(format!("Stored fact: {key} = {value}")))
            }),
        );

        let store = memory.clone();
        registry.register(
            "recall_facts",
            ToolBinding::sync(move |_input| {
                let facts = store.list_facts()?;
                if facts.is_empty() {
                    return Ok(json!("No user facts stored in memory"));
                }
                let lines: Vec<String> =
                    facts.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                Ok(json!(format!("User facts:\n{}", lines.join("\n"))))
            }),
        );

        let store = memory;
        registry.register(
            "save_note",
            ToolBinding::sync(move |input| {
                let title = str_field("save_note", &input, "title")?;
                let content = str_field("save_note", &input, "content")?;
                store.add_note(&title, &content)?;
                Ok(json!(format!("Note '{title}' added to memory")))
            }),
        );

        registry
    }
}
