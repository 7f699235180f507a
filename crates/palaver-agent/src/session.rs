use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use palaver_core::types::{ChatMessage, Role, SessionId};

/// A chat session: history plus free-form metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: SessionId,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ChatSession {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// User/assistant exchange lines prior to the latest message,
    /// formatted for prompt context.
    pub fn history_lines(&self, limit: usize) -> Vec<String> {
        let prior = self.messages.len().saturating_sub(1);
        let start = prior.saturating_sub(limit);
        self.messages[start..prior]
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let speaker = match m.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                    Role::System => "System",
                };
                format!("{speaker}: {}", m.content)
            })
            .collect()
    }
}
