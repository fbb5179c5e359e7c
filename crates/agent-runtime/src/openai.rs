//! OpenAI Assistants Backend
//!
//! Implementation of `AssistantBackend` against the OpenAI assistants
//! HTTP API (v2). All protocol quirks live here: bearer auth, the beta
//! header, and the mapping from raw run statuses into the closed
//! [`RunState`] set the core acts on.

use agent_core::{
    backend::{
        AssistantBackend, AssistantSpec, ContentBlock, RequiredCall, Role, RunState,
        ThreadMessage, ToolOutput,
    },
    error::{AgentError, Result},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VERSION: &str = "assistants=v2";
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// OpenAI backend configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API key for bearer auth
    pub api_key: String,

    /// Base URL, overridable for proxies and compatible services
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 120,
        }
    }

    /// Read configuration from `OPENAI_API_KEY` and `OPENAI_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AgentError::Config("OPENAI_API_KEY is not set".into()))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// OpenAI assistants backend
pub struct OpenAiAssistants {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiAssistants {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .bearer_auth(&self.config.api_key)
            .header(BETA_HEADER, BETA_VERSION)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AgentError::BackendUnavailable(e.to_string())
                } else {
                    AgentError::Backend(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentError::BackendUnavailable(format!(
                "rate limited: {body}"
            )));
        }
        if !status.is_success() {
            return Err(AgentError::Backend(format!("HTTP {status}: {body}")));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.send(self.http.post(self.url(path)).json(&body)).await
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.send(self.http.get(self.url(path))).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.send(self.http.delete(self.url(path))).await
    }

    /// Pull the `id` field out of a create response
    fn id_of(value: &Value) -> Result<String> {
        value["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| AgentError::Backend("response missing object id".into()))
    }

    /// Map a raw run object into the closed state set
    ///
    /// Anything not in the known status vocabulary is an
    /// `UnknownRunStatus` error, never a silent wait.
    fn parse_run_state(run: &Value) -> Result<RunState> {
        let status = run["status"].as_str().unwrap_or_default();
        match status {
            "queued" | "in_progress" | "cancelling" => Ok(RunState::Pending),
            "requires_action" => Ok(RunState::RequiresAction(Self::parse_required_calls(run))),
            "completed" => Ok(RunState::Completed),
            "failed" | "cancelled" | "expired" | "incomplete" => {
                let reason = run["last_error"]["message"]
                    .as_str()
                    .unwrap_or("no reason given")
                    .to_string();
                Ok(RunState::Failed {
                    status: status.to_string(),
                    reason,
                })
            }
            other => Err(AgentError::UnknownRunStatus(other.to_string())),
        }
    }

    fn parse_required_calls(run: &Value) -> Vec<RequiredCall> {
        run["required_action"]["submit_tool_outputs"]["tool_calls"]
            .as_array()
            .map(|calls| {
                calls
                    .iter()
                    .map(|call| RequiredCall {
                        call_id: call["id"].as_str().unwrap_or_default().to_string(),
                        name: call["function"]["name"]
                            .as_str()
                            .unwrap_or_default()
                            .to_string(),
                        arguments: call["function"]["arguments"]
                            .as_str()
                            .unwrap_or("{}")
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Convert a message-list response into thread messages, newest first
    fn parse_messages(list: &Value) -> Vec<ThreadMessage> {
        list["data"]
            .as_array()
            .map(|messages| messages.iter().map(Self::parse_message).collect())
            .unwrap_or_default()
    }

    fn parse_message(message: &Value) -> ThreadMessage {
        let role = match message["role"].as_str() {
            Some("user") => Role::User,
            _ => Role::Assistant,
        };

        let content = message["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .map(|block| match block["type"].as_str() {
                        Some("text") => ContentBlock::Text {
                            text: block["text"]["value"]
                                .as_str()
                                .unwrap_or_default()
                                .to_string(),
                        },
                        _ => ContentBlock::Unsupported,
                    })
                    .collect()
            })
            .unwrap_or_default();

        ThreadMessage {
            assistant_id: message["assistant_id"].as_str().map(String::from),
            role,
            content,
        }
    }
}

#[async_trait]
impl AssistantBackend for OpenAiAssistants {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String> {
        let body = json!({
            "name": spec.name,
            "instructions": spec.instructions,
            "tools": spec.tools,
            "model": spec.model,
        });
        let response = self.post("assistants", body).await?;
        let id = Self::id_of(&response)?;
        debug!(assistant_id = %id, name = %spec.name, "assistant created");
        Ok(id)
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<()> {
        self.delete(&format!("assistants/{assistant_id}")).await?;
        debug!(assistant_id, "assistant deleted");
        Ok(())
    }

    async fn create_thread(&self) -> Result<String> {
        let response = self.post("threads", json!({})).await?;
        Self::id_of(&response)
    }

    async fn post_message(&self, thread_id: &str, role: Role, text: &str) -> Result<()> {
        let body = json!({"role": role, "content": text});
        self.post(&format!("threads/{thread_id}/messages"), body)
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<String> {
        let body = json!({"assistant_id": assistant_id});
        let response = self.post(&format!("threads/{thread_id}/runs"), body).await?;
        Self::id_of(&response)
    }

    async fn run_state(&self, thread_id: &str, run_id: &str) -> Result<RunState> {
        let response = self.get(&format!("threads/{thread_id}/runs/{run_id}")).await?;
        Self::parse_run_state(&response)
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<()> {
        let body = json!({"tool_outputs": outputs});
        self.post(
            &format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
            body,
        )
        .await?;
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let response = self.get(&format!("threads/{thread_id}/messages")).await?;
        Ok(Self::parse_messages(&response))
    }
}
