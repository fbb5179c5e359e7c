//! Error Types for the NBA Analyst

use thiserror::Error;

use agent_core::AgentError;

pub type Result<T> = std::result::Result<T, AnalystError>;

#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("Stats API error: {0}")]
    StatsApi(String),

    #[error("Unknown team id: {0}")]
    UnknownTeam(String),

    #[error("Invalid arguments: {0}")]
    BadArguments(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Tools surface their failures through the dispatcher's error payload,
// which is typed against the core error.
impl From<AnalystError> for AgentError {
    fn from(e: AnalystError) -> Self {
        match e {
            AnalystError::Agent(inner) => inner,
            other => AgentError::Other(other.to_string()),
        }
    }
}
