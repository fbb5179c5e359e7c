//! # agent-runtime
//!
//! Remote backend implementations for the agent system.
//!
//! ## Backends
//!
//! - **OpenAI** (default): the OpenAI assistants API (v2)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::openai::OpenAiAssistants;
//!
//! let backend = Arc::new(OpenAiAssistants::from_env()?);
//! let session = Session::create(backend, log, &profile, registry).await?;
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiAssistants, OpenAiConfig};

// Re-export core types for convenience
pub use agent_core::{
    AgentError, AssistantBackend, Result, Role, RunState, Session, Tool, ToolRegistry,
};
