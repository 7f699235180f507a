use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use palaver_core::error::{PalaverError, Result};

/// A free-form note kept alongside the fact map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MemoryFile {
    #[serde(default)]
    user_facts: BTreeMap<String, String>,
    #[serde(default)]
    notes: Vec<Note>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemoryFile {
    fn empty() -> Self {
        let now = Utc::now();
        Self {
            user_facts: BTreeMap::new(),
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// File-backed key/value memory: user facts plus appended notes.
///
/// The whole store is one JSON document rewritten on every mutation.
/// A corrupted file is reset to the empty structure rather than
/// failing the host.
pub struct MemoryStore {
    path: PathBuf,
    state: Mutex<MemoryFile>,
}

impl MemoryStore {
    /// Open or create the store under `dir` (as `chat_memory.json`).
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| PalaverError::Storage(format!("failed to create memory dir: {e}")))?;
        let path = dir.join("chat_memory.json");

        let state = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<MemoryFile>(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "memory file corrupted, resetting");
                    MemoryFile::empty()
                }
            },
            Err(_) => MemoryFile::empty(),
        };

        let store = Self {
            path,
            state: Mutex::new(state),
        };
        store.persist()?;
        debug!(path = %store.path.display(), "memory store opened");
        Ok(store)
    }

    fn persist(&self) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| PalaverError::Storage(e.to_string()))?;
        state.updated_at = Utc::now();
        let json = serde_json::to_string_pretty(&*state)?;
        std::fs::write(&self.path, json)
            .map_err(|e| PalaverError::Storage(format!("failed to write memory file: {e}")))?;
        Ok(())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryFile) -> T) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| PalaverError::Storage(e.to_string()))?;
        Ok(f(&mut state))
    }

    /// Store a fact, overwriting any prior value for the key.
    pub fn set_fact(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        self.with_state(|s| {
            s.user_facts.insert(key.clone(), value.into());
        })?;
        debug!(%key, "stored user fact");
        self.persist()
    }

    /// Look up a fact by key.
    pub fn get_fact(&self, key: &str) -> Result<Option<String>> {
        self.with_state(|s| s.user_facts.get(key).cloned())
    }

    /// All facts, sorted by key.
    pub fn list_facts(&self) -> Result<Vec<(String, String)>> {
        self.with_state(|s| {
            s.user_facts
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
    }

    /// Remove a fact. Returns whether it existed.
    pub fn delete_fact(&self, key: &str) -> Result<bool> {
        let existed = self.with_state(|s| s.user_facts.remove(key).is_some())?;
        if existed {
            self.persist()?;
        }
        Ok(existed)
    }

    /// Append a note.
    pub fn add_note(&self, title: impl Into<String>, content: impl Into<String>) -> Result<()> {
        self.with_state(|s| {
            s.notes.push(Note {
                title: title.into(),
                content: content.into(),
                created_at: Utc::now(),
            });
        })?;
        self.persist()
    }

    /// All notes in insertion order.
    pub fn notes(&self) -> Result<Vec<Note>> {
        self.with_state(|s| s.notes.clone())
    }

    /// One-line counts of what the store holds.
    pub fn summary(&self) -> Result<String> {
        self.with_state(|s| {
            if s.user_facts.is_empty() && s.notes.is_empty() {
                "Memory is currently empty".to_string()
            } else {
                format!(
                    "Memory summary: {} facts, {} notes",
                    s.user_facts.len(),
                    s.notes.len()
                )
            }
        })
    }

    /// Drop all facts and notes.
    pub fn clear(&self) -> Result<()> {
        self.with_state(|s| {
            s.user_facts.clear();
            s.notes.clear();
        })?;
        self.persist()
    }
}
