//! Run Loop
//!
//! Drives one remote run to completion: poll at a fixed interval, serve
//! tool calls whenever the run blocks on requires-action, and collect the
//! final assistant message once it completes. Polling is bounded; a run
//! that never reaches a terminal state times out instead of spinning.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, info};

use crate::backend::{RequiredCall, Role, RunState, ToolOutput};
use crate::convo::{ConvoEntry, SYSTEM_AGENT};
use crate::error::{AgentError, Result};
use crate::session::Session;

/// Polling knobs for a single run
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Fixed delay between run-state polls
    pub poll_interval: Duration,

    /// Polls allowed before the run is declared stuck
    pub max_polls: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            max_polls: 100,
        }
    }
}

impl RunOptions {
    pub fn new(poll_interval: Duration, max_polls: usize) -> Self {
        Self {
            poll_interval,
            max_polls,
        }
    }
}

impl Session {
    /// Drive one exchange to completion with default polling
    pub async fn run(&mut self) -> Result<String> {
        self.run_with(&RunOptions::default()).await
    }

    /// Drive one exchange to completion
    ///
    /// Creates a run, then polls until it completes, fails, or exhausts
    /// `max_polls`. Requires-action states are served inline: every
    /// demanded call is dispatched through the registry and the outputs
    /// submitted back, errors included, so the model always gets an
    /// answer for every call id.
    pub async fn run_with(&mut self, options: &RunOptions) -> Result<String> {
        let run_id = self
            .backend
            .create_run(&self.thread_id, &self.assistant_id)
            .await?;
        info!(run_id, thread_id = %self.thread_id, "polling run");

        let thread_id = self.thread_id.clone();
        let text = self.poll_run(&thread_id, &run_id, options, true).await?;
        self.log
            .append(ConvoEntry::message(&text, &self.name, SYSTEM_AGENT))
            .await;
        self.last_response = Some(text.clone());
        Ok(text)
    }

    /// Ask this assistant one question on a scratch thread
    ///
    /// The exchange runs outside the session's own thread and is never
    /// written to the conversation log, so it leaves no trace in the
    /// main conversation. Used for side-channel prompting, e.g. asking
    /// the analyst to rewrite a query before the real exchange starts.
    pub async fn one_off(&self, prompt: &str, options: &RunOptions) -> Result<String> {
        let thread_id = self.backend.create_thread().await?;
        self.backend
            .post_message(&thread_id, Role::User, prompt)
            .await?;
        let run_id = self
            .backend
            .create_run(&thread_id, &self.assistant_id)
            .await?;
        debug!(run_id, thread_id, "polling one-off run");
        self.poll_run(&thread_id, &run_id, options, false).await
    }

    async fn poll_run(
        &self,
        thread_id: &str,
        run_id: &str,
        options: &RunOptions,
        log_exchange: bool,
    ) -> Result<String> {
        for _ in 0..options.max_polls {
            tokio::time::sleep(options.poll_interval).await;

            match self.backend.run_state(thread_id, run_id).await? {
                RunState::Pending => {}
                RunState::RequiresAction(calls) => {
                    debug!(run_id, calls = calls.len(), "run requires tool outputs");
                    let outputs = self.serve_tool_calls(&calls, log_exchange).await;
                    info!(run_id, "submitting output to run");
                    self.backend
                        .submit_tool_outputs(thread_id, run_id, &outputs)
                        .await?;
                }
                RunState::Completed => {
                    return self.assistant_text_in(thread_id).await?.ok_or_else(|| {
                        AgentError::Session(format!(
                            "run {run_id} completed without an assistant message"
                        ))
                    });
                }
                RunState::Failed { status, reason } => {
                    return Err(AgentError::RunFailed {
                        run_id: run_id.to_string(),
                        status,
                        reason,
                    });
                }
            }
        }

        Err(AgentError::RunTimeout {
            run_id: run_id.to_string(),
            polls: options.max_polls,
        })
    }

    /// Dispatch every demanded call, logging the exchange unless suppressed
    async fn serve_tool_calls(&self, calls: &[RequiredCall], log_exchange: bool) -> Vec<ToolOutput> {
        if log_exchange {
            self.log
                .append(ConvoEntry::function_call(json!(calls), &self.name))
                .await;
        }

        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            let output = self.registry.dispatch(&call.name, &call.arguments).await;
            outputs.push(ToolOutput {
                tool_call_id: call.call_id.clone(),
                output,
            });
        }

        if log_exchange {
            self.log
                .append(ConvoEntry::function_response(json!(outputs), &self.name))
                .await;
        }
        outputs
    }
}
