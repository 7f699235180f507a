use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tracing::{debug, info};

use palaver_core::config::{ModelConfig, RetryConfig};
use palaver_core::error::{PalaverError, Result};
use palaver_core::traits::ModelClient;
use palaver_core::types::{ChatMessage, ChatResponse, SessionId};
use palaver_llm::RetryPolicy;
use palaver_memory::MemoryStore;

use crate::session::ChatSession;

const HISTORY_WINDOW: usize = 20;

/// Routes user messages to the model backend through the retry layer,
/// keeping per-session history and optionally enriching prompts with
/// stored memory facts.
pub struct ChatHost {
    client: Arc<dyn ModelClient>,
    retry: RetryPolicy,
    system_prompt: String,
    sessions: Mutex<HashMap<String, ChatSession>>,
    memory: Option<Arc<MemoryStore>>,
}

impl ChatHost {
    pub fn new(client: Arc<dyn ModelClient>, model: &ModelConfig, retry: RetryConfig) -> Self {
        Self {
            client,
            retry: RetryPolicy::new(retry),
            system_prompt: model.system_prompt.clone(),
            sessions: Mutex::new(HashMap::new()),
            memory: None,
        }
    }

    /// Attach a memory store; its facts are prepended to every prompt.
    pub fn with_memory(mut self, memory: Arc<MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Create a session, generating an id when none is given.
    pub fn create_session(&self, session_id: Option<String>) -> SessionId {
        let id = session_id
            .map(|s| SessionId::from_str(&s))
            .unwrap_or_default();
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        sessions.insert(id.0.clone(), ChatSession::new(id.clone()));
        info!(session_id = %id, "created chat session");
        id
    }

    /// Snapshot of a session's current state.
    pub fn session(&self, session_id: &str) -> Result<ChatSession> {
        let sessions = self.sessions.lock().expect("session lock poisoned");
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| PalaverError::SessionNotFound(session_id.to_string()))
    }

    /// Send a user message and return the assistant's reply.
    ///
    /// The session is created on first use. The session lock is
    /// released before the model call and re-taken to append the
    /// reply.
    pub async fn send_message(&self, session_id: &str, message: &str) -> Result<ChatResponse> {
        let prompt = {
            let mut sessions = self.sessions.lock().expect("session lock poisoned");
            let session = sessions
                .entry(session_id.to_string())
                .or_insert_with(|| ChatSession::new(SessionId::from_str(session_id)));
            session.push(ChatMessage::user(message));
            self.build_prompt(session, message)?
        };

        debug!(session_id, "routing message to model backend");
        let reply = self.retry.invoke(self.client.as_ref(), &prompt).await?;

        {
            let mut sessions = self.sessions.lock().expect("session lock poisoned");
            if let Some(session) = sessions.get_mut(session_id) {
                session.push(ChatMessage::assistant(reply.text.clone()));
            }
        }

        Ok(ChatResponse {
            message: reply.text,
            session_id: SessionId::from_str(session_id),
            metadata: HashMap::from([("complete".to_string(), json!(true))]),
        })
    }

    fn build_prompt(&self, session: &ChatSession, message: &str) -> Result<String> {
        let mut prompt = String::new();
        prompt.push_str(&self.system_prompt);
        prompt.push_str("\n\n");

        if let Some(memory) = &self.memory {
            let facts = memory.list_facts()?;
            if !facts.is_empty() {
                prompt.push_str("Known user facts:\n");
                for (key, value) in facts {
                    prompt.push_str(&format!("- {key}: {value}\n"));
                }
                prompt.push('\n');
            }
        }

        let history = session.history_lines(HISTORY_WINDOW);
        if !history.is_empty() {
            prompt.push_str("Conversation so far:\n");
            for line in history {
                prompt.push_str(&line);
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        prompt.push_str("User: ");
        prompt.push_str(message);
        Ok(prompt)
    }
}
