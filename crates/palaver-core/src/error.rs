use thiserror::Error;

/// Failure kinds a model-call capability may surface.
///
/// The retry layer dispatches on the variant, never on message content.
#[derive(Debug, Error)]
pub enum ModelCallError {
    /// The backend explicitly asked for the call to be retried
    /// (rate limit, validation nudge from the model).
    #[error("model requested retry: {0}")]
    RetryRequested(String),

    /// Infrastructure-level failure: HTTP error, connectivity,
    /// unexpected backend behavior. Assumed likely to self-resolve.
    #[error("transient backend failure: {0}")]
    Transient(String),

    /// Hard failure. Never retried.
    #[error("model call failed: {0}")]
    Fatal(String),
}

#[derive(Debug, Error)]
pub enum PalaverError {
    // Workflow errors
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("invalid workflow: {0}")]
    Validation(String),

    #[error("node configuration error: {0}")]
    Configuration(String),

    /// Retry budget exhausted on a retry-requested backend signal.
    #[error("agent run failed: {0}")]
    AgentRun(String),

    /// Backend error surfaced unchanged, so callers can tell "the
    /// engine gave up" apart from "the backend itself is down".
    #[error(transparent)]
    Model(#[from] ModelCallError),

    // Tool errors
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool execution failed: {tool}: {message}")]
    ToolExecution { tool: String, message: String },

    // Session errors
    #[error("session not found: {0}")]
    SessionNotFound(String),

    // Storage errors
    #[error("memory store error: {0}")]
    Storage(String),

    // Config errors
    #[error("config error: {0}")]
    Config(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PalaverError>;
