//! Remote Assistant Backend Strategy Pattern
//!
//! Defines a common interface over remote assistant services that own the
//! model, its instructions, and the message thread. The agent core never
//! talks HTTP directly: it drives assistants, threads, and runs exclusively
//! through this trait, so tests can script the remote side.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::backend::{AssistantBackend, AssistantSpec, Role};
//!
//! let assistant_id = backend.create_assistant(&spec).await?;
//! let thread_id = backend.create_thread().await?;
//! backend.post_message(&thread_id, Role::User, "hello").await?;
//! let run_id = backend.create_run(&thread_id, &assistant_id).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Declarative description of a remote assistant at creation time
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistantSpec {
    /// Display name of the assistant
    pub name: String,

    /// System instructions governing its behavior
    pub instructions: String,

    /// Model identifier (e.g., "gpt-4o")
    pub model: String,

    /// Function-tool definitions in the wire format the backend expects
    #[serde(default)]
    pub tools: Vec<Value>,
}

/// Role of a message on a remote thread
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One tool invocation demanded by a run in the requires-action state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredCall {
    /// Backend-assigned id the output must be correlated with
    pub call_id: String,

    /// Tool name as the model spelled it
    pub name: String,

    /// Raw JSON arguments string, exactly as the wire carries it
    pub arguments: String,
}

/// Output submitted back for one required call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Closed set of run states the core acts on
///
/// Backends must map every remote status into one of these variants or
/// fail with [`AgentError::UnknownRunStatus`](crate::error::AgentError).
/// There is no fallthrough: a status this enum cannot represent is a
/// protocol change that has to surface, not spin.
#[derive(Clone, Debug, PartialEq)]
pub enum RunState {
    /// Queued, in progress, or cancelling. Nothing to do but wait.
    Pending,

    /// Blocked until outputs for these calls are submitted
    RequiresAction(Vec<RequiredCall>),

    /// Finished; the final message is on the thread
    Completed,

    /// Terminal without a result
    Failed { status: String, reason: String },
}

impl RunState {
    /// Whether the run has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed { .. })
    }
}

/// A typed content block of a thread message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text { text: String },

    /// Any block type this core does not consume (images, files)
    #[serde(other)]
    Unsupported,
}

/// One message on a remote thread
///
/// Backends return these newest-first, matching the remote list order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Id of the assistant that authored the message, if any
    pub assistant_id: Option<String>,

    /// Author role
    pub role: Role,

    /// Typed content blocks in wire order
    pub content: Vec<ContentBlock>,
}

impl ThreadMessage {
    /// First text-typed content block, if the message carries one
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Unsupported => None,
        })
    }
}

/// Strategy trait for remote assistant services
///
/// Implement this trait to add support for a new assistant backend.
/// Sessions and the run loop work exclusively through this interface.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Create a remote assistant and return its id
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String>;

    /// Delete a remote assistant
    async fn delete_assistant(&self, assistant_id: &str) -> Result<()>;

    /// Create an empty message thread and return its id
    async fn create_thread(&self) -> Result<String>;

    /// Append a message to a thread
    async fn post_message(&self, thread_id: &str, role: Role, text: &str) -> Result<()>;

    /// Start a run of an assistant against a thread and return the run id
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<String>;

    /// Fetch the current state of a run
    async fn run_state(&self, thread_id: &str, run_id: &str) -> Result<RunState>;

    /// Submit tool outputs for a run blocked in the requires-action state
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<()>;

    /// List the messages of a thread, newest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_terminal() {
        assert!(RunState::Completed.is_terminal());
        assert!(
            RunState::Failed {
                status: "expired".into(),
                reason: "no reason given".into(),
            }
            .is_terminal()
        );
        assert!(!RunState::Pending.is_terminal());
        assert!(!RunState::RequiresAction(Vec::new()).is_terminal());
    }

    #[test]
    fn test_first_text_skips_unsupported_blocks() {
        let message = ThreadMessage {
            assistant_id: Some("asst_1".into()),
            role: Role::Assistant,
            content: vec![
                ContentBlock::Unsupported,
                ContentBlock::Text {
                    text: "the answer".into(),
                },
                ContentBlock::Text {
                    text: "a later block".into(),
                },
            ],
        };
        assert_eq!(message.first_text(), Some("the answer"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
