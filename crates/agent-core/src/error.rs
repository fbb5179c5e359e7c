//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Remote assistant backend returned an error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend unreachable or not responding
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Run reported a status outside the closed state set
    #[error("Unknown run status: {0}")]
    UnknownRunStatus(String),

    /// Run reached a terminal non-completed status
    #[error("Run {run_id} ended as '{status}': {reason}")]
    RunFailed {
        run_id: String,
        status: String,
        reason: String,
    },

    /// Run never left the pending states within the poll budget
    #[error("Run {run_id} still pending after {polls} polls")]
    RunTimeout { run_id: String, polls: usize },

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Store read or write failed
    #[error("Store error: {0}")]
    Store(String),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::BackendUnavailable(_) | AgentError::Io(_)
        )
    }

    /// Errors that must abort the exchange rather than be fed back to the model
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgentError::UnknownRunStatus(_)
                | AgentError::RunFailed { .. }
                | AgentError::RunTimeout { .. }
                | AgentError::Config(_)
        )
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}
