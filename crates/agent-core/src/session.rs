//! Session Management
//!
//! A session pairs one remote assistant with one remote thread and owns
//! everything the agent needs to converse: the backend handle, the tool
//! registry consulted during runs, and the conversation log. Sessions are
//! created from stored profiles; the remote ids live only as long as the
//! session unless the caller skips [`Session::delete`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{AssistantBackend, AssistantSpec, Role};
use crate::convo::{ConvoEntry, ConvoLog, SYSTEM_AGENT};
use crate::error::Result;
use crate::profile::AgentProfile;
use crate::tool::ToolRegistry;

/// A live agent: remote assistant + thread + local dispatch state
pub struct Session {
    pub(crate) name: String,
    pub(crate) assistant_id: String,
    pub(crate) thread_id: String,
    pub(crate) backend: Arc<dyn AssistantBackend>,
    pub(crate) registry: Arc<ToolRegistry>,
    pub(crate) log: ConvoLog,
    pub(crate) last_response: Option<String>,
}

impl Session {
    /// Create the remote assistant and thread described by `profile`
    ///
    /// The profile's stored tool definitions are advertised remotely; if
    /// the profile carries none, the registry's schemas are used so the
    /// advertised set can never drift from what dispatch can serve.
    pub async fn create(
        backend: Arc<dyn AssistantBackend>,
        log: ConvoLog,
        profile: &AgentProfile,
        registry: Arc<ToolRegistry>,
    ) -> Result<Self> {
        let tools = if profile.tools.is_empty() {
            registry.wire_schemas()
        } else {
            profile.tools.clone()
        };

        let spec = AssistantSpec {
            name: profile.name.clone(),
            instructions: profile.instructions.clone(),
            model: profile.model.clone(),
            tools,
        };

        let assistant_id = backend.create_assistant(&spec).await?;
        let thread_id = backend.create_thread().await?;
        info!(
            agent = %profile.name,
            assistant_id,
            thread_id,
            "session created"
        );

        Ok(Self {
            name: profile.name.clone(),
            assistant_id,
            thread_id,
            backend,
            registry,
            log,
            last_response: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Final text of the most recent completed run, if any
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    /// Append a user-role message to the thread and log it
    pub async fn post_user_message(&self, text: &str) -> Result<()> {
        info!(thread_id = %self.thread_id, "adding message to thread");
        self.backend
            .post_message(&self.thread_id, Role::User, text)
            .await?;
        self.log
            .append(ConvoEntry::message(text, SYSTEM_AGENT, &self.name))
            .await;
        Ok(())
    }

    /// Append a message authored by this agent itself
    ///
    /// Used when an agent narrates its own plan onto the thread, e.g.
    /// the analyst recording the data requests it is about to send out.
    pub async fn post_agent_message(&self, text: &str) -> Result<()> {
        debug!(thread_id = %self.thread_id, agent = %self.name, "adding agent message to thread");
        self.backend
            .post_message(&self.thread_id, Role::Assistant, text)
            .await?;
        self.log
            .append(ConvoEntry::message(text, &self.name, SYSTEM_AGENT))
            .await;
        Ok(())
    }

    /// The latest reply this session's assistant left on the thread
    ///
    /// Messages arrive newest-first; only the most recent message from
    /// this assistant is considered, and only its first text block. A
    /// matching message with no text yields `None`.
    pub async fn fetch_last_assistant_text(&self) -> Result<Option<String>> {
        self.assistant_text_in(&self.thread_id).await
    }

    pub(crate) async fn assistant_text_in(&self, thread_id: &str) -> Result<Option<String>> {
        let messages = self.backend.list_messages(thread_id).await?;
        for message in &messages {
            if message.assistant_id.as_deref() == Some(self.assistant_id.as_str()) {
                let text = message.first_text().map(String::from);
                if let Some(text) = &text {
                    debug!(thread_id, "assistant message: {text}");
                }
                return Ok(text);
            }
        }
        Ok(None)
    }

    /// Retire the remote assistant; failures are logged, never raised
    pub async fn delete(&self) {
        if let Err(e) = self.backend.delete_assistant(&self.assistant_id).await {
            warn!(
                assistant_id = %self.assistant_id,
                error = %e,
                "failed to delete assistant"
            );
        }
    }
}
