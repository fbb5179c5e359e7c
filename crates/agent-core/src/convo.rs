//! Conversation Records
//!
//! Durable, append-only transcripts of agent exchanges. Every thread
//! message, tool-call request, and tool response lands here in arrival
//! order, keyed by a conversation id that outlives the remote thread.
//!
//! Persistence is strictly best-effort: a failed write is logged and
//! reported as a boolean, never raised, so losing a transcript entry
//! cannot abort an in-flight exchange.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::{AgentError, Result};

/// Agent name used for entries that originate outside any agent
pub const SYSTEM_AGENT: &str = "system";

/// Kind of entry in a conversation record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgType {
    /// Plain text exchanged on the thread
    Message,
    /// Tool calls a run demanded
    FunctionCall,
    /// Outputs submitted back for those calls
    FunctionResponse,
}

impl std::fmt::Display for MsgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MsgType::Message => write!(f, "message"),
            MsgType::FunctionCall => write!(f, "function_call"),
            MsgType::FunctionResponse => write!(f, "function_response"),
        }
    }
}

/// One immutable entry in a conversation record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConvoEntry {
    /// Payload: a text message or the structured call/response value
    pub message: Value,

    /// What kind of payload this is
    pub msg_type: MsgType,

    /// Agent the entry is from
    pub from_agent: String,

    /// Agent the entry is addressed to
    pub to_agent: String,

    /// When the entry was recorded
    #[serde(default = "Utc::now")]
    pub at: DateTime<Utc>,
}

impl ConvoEntry {
    fn new(message: Value, msg_type: MsgType, from_agent: String, to_agent: String) -> Self {
        Self {
            message,
            msg_type,
            from_agent,
            to_agent,
            at: Utc::now(),
        }
    }

    /// A plain text message between two agents
    pub fn message(
        text: impl Into<String>,
        from_agent: impl Into<String>,
        to_agent: impl Into<String>,
    ) -> Self {
        Self::new(
            Value::String(text.into()),
            MsgType::Message,
            from_agent.into(),
            to_agent.into(),
        )
    }

    /// The tool calls a run demanded from `agent`
    pub fn function_call(calls: Value, agent: impl Into<String>) -> Self {
        let agent = agent.into();
        Self::new(calls, MsgType::FunctionCall, agent.clone(), agent)
    }

    /// The outputs `agent` submitted back to its run
    pub fn function_response(outputs: Value, agent: impl Into<String>) -> Self {
        let agent = agent.into();
        Self::new(outputs, MsgType::FunctionResponse, agent.clone(), agent)
    }
}

/// Append-only record of one top-level conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConvoRecord {
    /// Stable id; one swarm invocation maps to exactly one record
    pub convo_id: String,

    /// Organization the conversation belongs to
    pub org: String,

    /// Entries in arrival order
    pub convo: Vec<ConvoEntry>,
}

impl ConvoRecord {
    pub fn new(convo_id: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            convo_id: convo_id.into(),
            org: org.into(),
            convo: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.convo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.convo.is_empty()
    }
}

/// Storage seam for conversation records
#[async_trait]
pub trait ConvoStore: Send + Sync {
    /// Establish a record for `convo_id`, a no-op if it already exists
    async fn create(&self, convo_id: &str, org: &str) -> Result<()>;

    /// Append one entry; existing entries are never rewritten
    async fn append(&self, convo_id: &str, entry: &ConvoEntry) -> Result<()>;

    /// Load a full record, `None` if the id is unknown
    async fn load(&self, convo_id: &str) -> Result<Option<ConvoRecord>>;
}

/// Logger every session writes through
///
/// Binds a store handle to one conversation id. In non-persisting mode
/// (no store) every append succeeds without touching anything, which is
/// how test and dry-run deployments avoid accumulating transcripts.
#[derive(Clone)]
pub struct ConvoLog {
    store: Option<Arc<dyn ConvoStore>>,
    convo_id: String,
}

impl ConvoLog {
    /// A persisting log backed by `store`
    pub fn new(store: Arc<dyn ConvoStore>, convo_id: impl Into<String>) -> Self {
        Self {
            store: Some(store),
            convo_id: convo_id.into(),
        }
    }

    /// A non-persisting log: appends report success and write nothing
    pub fn disabled(convo_id: impl Into<String>) -> Self {
        Self {
            store: None,
            convo_id: convo_id.into(),
        }
    }

    pub fn convo_id(&self) -> &str {
        &self.convo_id
    }

    pub fn is_persisting(&self) -> bool {
        self.store.is_some()
    }

    /// Append an entry, reporting whether it was durably recorded
    ///
    /// Store failures are logged and swallowed here. Callers that care
    /// can inspect the boolean; the run loop does not.
    pub async fn append(&self, entry: ConvoEntry) -> bool {
        let Some(store) = &self.store else {
            info!("convo persistence disabled, not adding to convo");
            return true;
        };

        debug!(convo_id = %self.convo_id, msg_type = %entry.msg_type, "adding to convo");
        match store.append(&self.convo_id, &entry).await {
            Ok(()) => true,
            Err(e) => {
                error!(convo_id = %self.convo_id, error = %e, "failed to add to convo");
                false
            }
        }
    }
}

/// In-memory conversation store for tests and single-process runs
#[derive(Default)]
pub struct MemoryConvoStore {
    records: Mutex<HashMap<String, ConvoRecord>>,
}

impl MemoryConvoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn count(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl ConvoStore for MemoryConvoStore {
    async fn create(&self, convo_id: &str, org: &str) -> Result<()> {
        let mut records = self.records.lock().await;
        records
            .entry(convo_id.to_string())
            .or_insert_with(|| ConvoRecord::new(convo_id, org));
        Ok(())
    }

    async fn append(&self, convo_id: &str, entry: &ConvoEntry) -> Result<()> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(convo_id)
            .ok_or_else(|| AgentError::Store(format!("unknown convo: {convo_id}")))?;
        record.convo.push(entry.clone());
        Ok(())
    }

    async fn load(&self, convo_id: &str) -> Result<Option<ConvoRecord>> {
        let records = self.records.lock().await;
        Ok(records.get(convo_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_constructors() {
        let entry = ConvoEntry::message("tell me about the Knicks", SYSTEM_AGENT, "nba_analyst");
        assert_eq!(entry.msg_type, MsgType::Message);
        assert_eq!(entry.from_agent, "system");
        assert_eq!(entry.to_agent, "nba_analyst");

        let call = ConvoEntry::function_call(json!([{"name": "get_lineups"}]), "nba_data_guy");
        assert_eq!(call.msg_type, MsgType::FunctionCall);
        assert_eq!(call.from_agent, call.to_agent);
    }

    #[tokio::test]
    async fn test_memory_store_appends_in_order() {
        let store = MemoryConvoStore::new();
        store.create("c1", "nba").await.unwrap();

        for i in 0..3 {
            let entry = ConvoEntry::message(format!("msg {i}"), SYSTEM_AGENT, "nba_analyst");
            store.append("c1", &entry).await.unwrap();
        }

        let record = store.load("c1").await.unwrap().unwrap();
        assert_eq!(record.org, "nba");
        assert_eq!(record.len(), 3);
        assert_eq!(record.convo[0].message, json!("msg 0"));
        assert_eq!(record.convo[2].message, json!("msg 2"));
    }

    #[tokio::test]
    async fn test_append_to_unknown_convo_fails() {
        let store = MemoryConvoStore::new();
        let entry = ConvoEntry::message("hi", SYSTEM_AGENT, "nba_analyst");
        assert!(store.append("missing", &entry).await.is_err());
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let store = MemoryConvoStore::new();
        store.create("c1", "nba").await.unwrap();
        let entry = ConvoEntry::message("hi", SYSTEM_AGENT, "nba_analyst");
        store.append("c1", &entry).await.unwrap();

        store.create("c1", "nba").await.unwrap();
        let record = store.load("c1").await.unwrap().unwrap();
        assert_eq!(record.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_log_reports_success() {
        let log = ConvoLog::disabled("c1");
        assert!(!log.is_persisting());
        assert!(
            log.append(ConvoEntry::message("hi", SYSTEM_AGENT, "nba_analyst"))
                .await
        );
    }

    struct FailingStore;

    #[async_trait]
    impl ConvoStore for FailingStore {
        async fn create(&self, _convo_id: &str, _org: &str) -> Result<()> {
            Err(AgentError::Store("down".into()))
        }

        async fn append(&self, _convo_id: &str, _entry: &ConvoEntry) -> Result<()> {
            Err(AgentError::Store("down".into()))
        }

        async fn load(&self, _convo_id: &str) -> Result<Option<ConvoRecord>> {
            Err(AgentError::Store("down".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let log = ConvoLog::new(Arc::new(FailingStore), "c1");
        let recorded = log
            .append(ConvoEntry::message("hi", SYSTEM_AGENT, "nba_analyst"))
            .await;
        assert!(!recorded);
    }
}
