//! End-to-end exercise of the assembled stack: a data-guy session serving
//! a scripted run over the SQLite store, with the stats toolkit landing a
//! real fact batch and the conversation log capturing the exchange.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_core::backend::{
    AssistantBackend, AssistantSpec, ContentBlock, RequiredCall, Role, RunState, ThreadMessage,
    ToolOutput,
};
use agent_core::{ConvoLog, ConvoStore, FactQuery, FactStore, MsgType, RunOptions, Session, Tool};
use agent_store::SqliteStore;
use nba_analyst::tools::{data_guy_registry, DataLookupTool};
use nba_analyst::{data_guy_profile, seed_defaults, MockStatsSource, ORG};

/// Backend double: replays scripted run states, records submitted outputs
struct ScriptedBackend {
    states: Mutex<VecDeque<RunState>>,
    submitted: Mutex<Vec<Vec<ToolOutput>>>,
    reply: String,
}

impl ScriptedBackend {
    fn new(states: Vec<RunState>, reply: &str) -> Self {
        Self {
            states: Mutex::new(states.into()),
            submitted: Mutex::new(Vec::new()),
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl AssistantBackend for ScriptedBackend {
    async fn create_assistant(&self, _spec: &AssistantSpec) -> agent_core::Result<String> {
        Ok("asst_1".into())
    }

    async fn delete_assistant(&self, _assistant_id: &str) -> agent_core::Result<()> {
        Ok(())
    }

    async fn create_thread(&self) -> agent_core::Result<String> {
        Ok("thread_1".into())
    }

    async fn post_message(&self, _thread_id: &str, _role: Role, _text: &str) -> agent_core::Result<()> {
        Ok(())
    }

    async fn create_run(&self, _thread_id: &str, _assistant_id: &str) -> agent_core::Result<String> {
        Ok("run_1".into())
    }

    async fn run_state(&self, _thread_id: &str, _run_id: &str) -> agent_core::Result<RunState> {
        let mut states = self.states.lock().unwrap();
        Ok(states.pop_front().unwrap_or(RunState::Pending))
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: &[ToolOutput],
    ) -> agent_core::Result<()> {
        self.submitted.lock().unwrap().push(outputs.to_vec());
        Ok(())
    }

    async fn list_messages(&self, _thread_id: &str) -> agent_core::Result<Vec<ThreadMessage>> {
        Ok(vec![ThreadMessage {
            assistant_id: Some("asst_1".into()),
            role: Role::Assistant,
            content: vec![ContentBlock::Text {
                text: self.reply.clone(),
            }],
        }])
    }
}

fn batch_id(summary: &str) -> &str {
    let start = summary.find("doc_id: ").expect("summary names its batch") + "doc_id: ".len();
    summary[start..].split_whitespace().next().unwrap()
}

#[tokio::test]
async fn test_data_guy_run_lands_batch_in_sqlite_and_logs_exchange() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let facts: Arc<dyn FactStore> = store.clone();
    let registry = Arc::new(data_guy_registry(Arc::new(MockStatsSource::new()), facts.clone()));

    let backend = Arc::new(ScriptedBackend::new(
        vec![
            RunState::Pending,
            RunState::RequiresAction(vec![RequiredCall {
                call_id: "call_1".into(),
                name: "get_hustle_stats_team".into(),
                arguments: "{}".into(),
            }]),
            RunState::Completed,
        ],
        "Hustle stats stored.",
    ));

    store.create("c1", ORG).await.unwrap();
    let log = ConvoLog::new(store.clone() as Arc<dyn ConvoStore>, "c1");
    let profile = data_guy_profile("gpt-4o", "1", registry.wire_schemas());

    let mut session = Session::create(backend.clone(), log, &profile, registry)
        .await
        .unwrap();
    session.post_user_message("How does Boston hustle?").await.unwrap();

    let options = RunOptions::new(Duration::from_millis(1), 10);
    let answer = session.run_with(&options).await.unwrap();
    assert_eq!(answer, "Hustle stats stored.");

    // The tool output submitted back carries the batch summary
    let submitted = backend.submitted.lock().unwrap().clone();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0][0].tool_call_id, "call_1");
    let summary = submitted[0][0].output.clone();
    assert!(summary.starts_with("hustle_stats_team info added to DB with doc_id: "));

    // Both canned rows landed under one batch id
    let doc_id = batch_id(&summary).to_string();
    let rows = facts.find(&FactQuery::for_batch(&doc_id)).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["doc_id"] == json!(doc_id)));

    // The whole exchange is on the durable conversation record, in order
    let record = store.load("c1").await.unwrap().unwrap();
    let kinds: Vec<MsgType> = record.convo.iter().map(|e| e.msg_type).collect();
    assert_eq!(
        kinds,
        vec![
            MsgType::Message,
            MsgType::FunctionCall,
            MsgType::FunctionResponse,
            MsgType::Message,
        ]
    );

    // And the lookup tool slices the same batch back out, tags stripped
    let lookup = DataLookupTool::new(facts);
    let output = lookup
        .execute(&json!({
            "doc_id": doc_id,
            "query": r#"{"TEAM_NAME": "Boston Celtics"}"#
        }))
        .await
        .unwrap();
    let payload: Value = serde_json::from_str(&output).unwrap();
    let found: Vec<Value> = serde_json::from_str(payload["results"].as_str().unwrap()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["DEFLECTIONS"], 16.2);
    assert!(found[0].get("doc_id").is_none());
}

#[tokio::test]
async fn test_seeding_into_sqlite_survives_reassembly() {
    let store = SqliteStore::in_memory().unwrap();
    let registry = data_guy_registry(
        Arc::new(MockStatsSource::new()),
        Arc::new(SqliteStore::in_memory().unwrap()),
    );

    seed_defaults(&store, "gpt-4o", registry.wire_schemas())
        .await
        .unwrap();
    seed_defaults(&store, "gpt-4o-mini", Vec::new()).await.unwrap();

    // The second seeding must not clobber the first
    use agent_core::ProfileStore;
    let data_guy = store.get("nba_data_guy", ORG, "1").await.unwrap().unwrap();
    assert_eq!(data_guy.model, "gpt-4o");
    assert_eq!(data_guy.tools.len(), 5);

    let analyst = store.get("nba_analyst", ORG, "1").await.unwrap().unwrap();
    assert!(analyst.tools.is_empty());
}
