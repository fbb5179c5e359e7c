//! Analyst Workflow
//!
//! The research loop that answers a user question: the analyst rewrites
//! the question into one data request per data guy, narrates the
//! fan-out onto its own thread, collects each data guy's findings, and
//! keeps asking for follow-ups until it judges the data sufficient.
//! Every remote assistant created along the way is retired on the way
//! out, success or not.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use agent_core::{
    AgentProfile, AssistantBackend, ConvoLog, ConvoStore, ProfileStore, RunOptions, Session,
    ToolRegistry, DEFAULT_INSTANCE,
};

use crate::error::{AnalystError, Result};
use crate::profiles::{ANALYST_NAME, DATA_GUY_NAME, ORG};
use crate::prompts::{render, DATA_EVAL, EXTRAPOLATE_QUERY, FINAL_ANALYSIS, FOLLOW_UP_REQUEST, PLANNING};

/// Follow-up rounds allowed before analysis proceeds on what exists
const MAX_FOLLOW_UPS: usize = 5;

/// Everything the workflow needs injected
pub struct SwarmDeps {
    pub backend: Arc<dyn AssistantBackend>,

    /// `None` runs the swarm without conversation persistence
    pub convo_store: Option<Arc<dyn ConvoStore>>,

    pub profile_store: Arc<dyn ProfileStore>,

    /// Tools served during analyst runs; empty today, the analyst reasons
    /// over text the workflow places on its thread
    pub analyst_registry: Arc<ToolRegistry>,

    /// Tools served during data-guy runs
    pub data_guy_registry: Arc<ToolRegistry>,

    pub run_options: RunOptions,
}

impl SwarmDeps {
    /// Conversation log handle for one conversation id
    pub fn log_for(&self, convo_id: &str) -> ConvoLog {
        match &self.convo_store {
            Some(store) => ConvoLog::new(store.clone(), convo_id),
            None => ConvoLog::disabled(convo_id),
        }
    }
}

/// One assembled research team bound to a conversation
pub struct Swarm<'a> {
    deps: &'a SwarmDeps,
    convo_id: String,
    analyst: Session,
    data_profiles: Vec<AgentProfile>,
    data_sessions: BTreeMap<String, Session>,
}

impl<'a> Swarm<'a> {
    /// Load profiles and bring the analyst online
    ///
    /// Profiles are validated before any remote assistant is created, so
    /// a misconfigured deployment fails without leaking assistants.
    pub async fn assemble(deps: &'a SwarmDeps, convo_id: &str) -> Result<Swarm<'a>> {
        let analyst_profile = deps
            .profile_store
            .get(ANALYST_NAME, ORG, DEFAULT_INSTANCE)
            .await?
            .ok_or_else(|| {
                AnalystError::Workflow(format!("no stored profile for {ANALYST_NAME}"))
            })?;

        let data_profiles = deps.profile_store.list(DATA_GUY_NAME, ORG).await?;
        if data_profiles.is_empty() {
            return Err(AnalystError::Workflow(format!(
                "no {DATA_GUY_NAME} profiles are stored"
            )));
        }

        if let Some(store) = &deps.convo_store {
            if let Err(e) = store.create(convo_id, ORG).await {
                warn!(convo_id, error = %e, "could not ensure conversation record");
            }
        }

        let analyst = Session::create(
            deps.backend.clone(),
            deps.log_for(convo_id),
            &analyst_profile,
            deps.analyst_registry.clone(),
        )
        .await?;

        Ok(Swarm {
            deps,
            convo_id: convo_id.to_string(),
            analyst,
            data_profiles,
            data_sessions: BTreeMap::new(),
        })
    }

    /// Run the full research loop for one question
    pub async fn answer(&mut self, message: &str) -> Result<String> {
        self.analyst.post_user_message(message).await?;

        // One rewritten data request per data guy, produced off-thread
        let mut requests: Vec<(String, String)> = Vec::new();
        for profile in &self.data_profiles {
            let tools = sourcing_tools_text(&profile.tools)?;
            let prompt = render(EXTRAPOLATE_QUERY, &[("query", message), ("tools", &tools)]);
            let request = self.analyst.one_off(&prompt, &self.deps.run_options).await?;
            requests.push((profile.instance.clone(), request));
        }

        // Narrate the fan-out in the analyst's own voice
        let mut requests_str = String::new();
        for (instance, request) in &requests {
            requests_str.push_str(&format!("{DATA_GUY_NAME}_{instance}: {request}\n"));
        }
        self.analyst.post_agent_message(&requests_str).await?;

        let mut gathered = Vec::new();
        for (instance, request) in &requests {
            let data = self.request_data(instance, request).await?;
            gathered.push((instance.clone(), data));
        }

        let mut analysis = String::new();
        for (instance, mut data) in gathered {
            let mut evaluation = self.evaluate(&data, message).await?;

            let mut rounds = 0;
            while !approved(&evaluation) && rounds < MAX_FOLLOW_UPS {
                rounds += 1;
                self.analyst.post_user_message(FOLLOW_UP_REQUEST).await?;
                let follow_up = self.analyst.run_with(&self.deps.run_options).await?;

                data = self.request_data(&instance, &follow_up).await?;
                evaluation = self.evaluate(&data, message).await?;
            }
            if !approved(&evaluation) {
                warn!(
                    convo_id = %self.convo_id,
                    instance,
                    "evaluation never approved the data, analyzing what exists"
                );
            }

            self.analyst.post_user_message(FINAL_ANALYSIS).await?;
            analysis = self.analyst.run_with(&self.deps.run_options).await?;
        }

        Ok(analysis)
    }

    /// Send one request to a data guy, creating its session on first use
    async fn request_data(&mut self, instance: &str, request: &str) -> Result<String> {
        if !self.data_sessions.contains_key(instance) {
            let profile = self
                .data_profiles
                .iter()
                .find(|p| p.instance == instance)
                .ok_or_else(|| {
                    AnalystError::Workflow(format!("no data guy profile for instance {instance}"))
                })?;

            info!(agent = %profile.instance_name(), "initializing data guy");
            let session = Session::create(
                self.deps.backend.clone(),
                self.deps.log_for(&self.convo_id),
                profile,
                self.deps.data_guy_registry.clone(),
            )
            .await?;
            self.data_sessions.insert(instance.to_string(), session);
        }

        let Some(session) = self.data_sessions.get_mut(instance) else {
            return Err(AnalystError::Workflow(format!(
                "data guy session missing for instance {instance}"
            )));
        };
        session.post_user_message(request).await?;
        Ok(session.run_with(&self.deps.run_options).await?)
    }

    /// Ask the analyst to break the question into the data points needed,
    /// before any sourcing happens
    pub async fn planning_step(&mut self) -> Result<String> {
        self.analyst.post_user_message(PLANNING).await?;
        Ok(self.analyst.run_with(&self.deps.run_options).await?)
    }

    /// Ask the analyst whether the data answers the question
    async fn evaluate(&mut self, data: &str, question: &str) -> Result<String> {
        let prompt = render(DATA_EVAL, &[("data", data), ("query", question)]);
        self.analyst.post_user_message(&prompt).await?;
        Ok(self.analyst.run_with(&self.deps.run_options).await?)
    }

    /// Retire every remote assistant this swarm created
    pub async fn shutdown(self) {
        self.analyst.delete().await;
        for session in self.data_sessions.values() {
            session.delete().await;
        }
    }
}

/// Answer one question end to end, then tear the swarm down
pub async fn run_analyst(deps: &SwarmDeps, convo_id: &str, message: &str) -> Result<String> {
    info!(convo_id, "starting analyst workflow");
    let mut swarm = Swarm::assemble(deps, convo_id).await?;
    let outcome = swarm.answer(message).await;
    swarm.shutdown().await;
    outcome
}

/// Whether an evaluation verdict accepts the gathered data
fn approved(evaluation: &str) -> bool {
    evaluation.to_lowercase().contains("yes")
}

/// Wire tool definitions worth advertising in the extrapolation prompt
///
/// The lookup tool is the data guy's own concern; the analyst only needs
/// to know what can be sourced.
fn sourcing_tools_text(tools: &[Value]) -> Result<String> {
    let sourcing: Vec<&Value> = tools
        .iter()
        .filter(|tool| {
            tool.pointer("/function/name").and_then(Value::as_str) != Some("data_lookup")
        })
        .collect();
    Ok(serde_json::to_string_pretty(&sourcing)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{analyst_profile, data_guy_profile};
    use agent_core::backend::{
        AssistantSpec, ContentBlock, Role, RunState, ThreadMessage, ToolOutput,
    };
    use agent_core::{MemoryConvoStore, MemoryProfileStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend double for multi-session workflows: assistants and threads
    /// get sequential ids, every run completes immediately, and each
    /// completion consumes the next scripted (assistant_id, text) reply.
    struct WorkflowBackend {
        assistants: Mutex<Vec<String>>,
        threads: Mutex<usize>,
        replies: Mutex<VecDeque<(String, String)>>,
        posted: Mutex<Vec<(String, Role, String)>>,
        deleted: Mutex<Vec<String>>,
    }

    impl WorkflowBackend {
        fn new(replies: Vec<(&str, &str)>) -> Self {
            Self {
                assistants: Mutex::new(Vec::new()),
                threads: Mutex::new(0),
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|(id, text)| (id.to_string(), text.to_string()))
                        .collect(),
                ),
                posted: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn posts_to(&self, thread_id: &str) -> Vec<(Role, String)> {
            self.posted
                .lock()
                .unwrap()
                .iter()
                .filter(|(thread, _, _)| thread == thread_id)
                .map(|(_, role, text)| (*role, text.clone()))
                .collect()
        }
    }

    #[async_trait]
    impl AssistantBackend for WorkflowBackend {
        async fn create_assistant(&self, spec: &AssistantSpec) -> agent_core::Result<String> {
            let mut assistants = self.assistants.lock().unwrap();
            assistants.push(spec.name.clone());
            Ok(format!("asst_{}", assistants.len()))
        }

        async fn delete_assistant(&self, assistant_id: &str) -> agent_core::Result<()> {
            self.deleted.lock().unwrap().push(assistant_id.to_string());
            Ok(())
        }

        async fn create_thread(&self) -> agent_core::Result<String> {
            let mut threads = self.threads.lock().unwrap();
            *threads += 1;
            Ok(format!("thread_{threads}"))
        }

        async fn post_message(
            &self,
            thread_id: &str,
            role: Role,
            text: &str,
        ) -> agent_core::Result<()> {
            self.posted
                .lock()
                .unwrap()
                .push((thread_id.to_string(), role, text.to_string()));
            Ok(())
        }

        async fn create_run(
            &self,
            _thread_id: &str,
            _assistant_id: &str,
        ) -> agent_core::Result<String> {
            Ok("run_1".into())
        }

        async fn run_state(&self, _thread_id: &str, _run_id: &str) -> agent_core::Result<RunState> {
            Ok(RunState::Completed)
        }

        async fn submit_tool_outputs(
            &self,
            _thread_id: &str,
            _run_id: &str,
            _outputs: &[ToolOutput],
        ) -> agent_core::Result<()> {
            Ok(())
        }

        async fn list_messages(
            &self,
            _thread_id: &str,
        ) -> agent_core::Result<Vec<ThreadMessage>> {
            let reply = self.replies.lock().unwrap().pop_front();
            Ok(reply
                .map(|(assistant_id, text)| {
                    vec![ThreadMessage {
                        assistant_id: Some(assistant_id),
                        role: Role::Assistant,
                        content: vec![ContentBlock::Text { text }],
                    }]
                })
                .unwrap_or_default())
        }
    }

    async fn seeded_profiles() -> Arc<MemoryProfileStore> {
        let store = Arc::new(MemoryProfileStore::new());
        store.upsert(&analyst_profile("gpt-4o")).await.unwrap();
        store
            .upsert(&data_guy_profile(
                "gpt-4o",
                "1",
                vec![
                    json!({"type": "function", "function": {"name": "get_lineups"}}),
                    json!({"type": "function", "function": {"name": "data_lookup"}}),
                ],
            ))
            .await
            .unwrap();
        store
    }

    fn deps(backend: Arc<WorkflowBackend>, profiles: Arc<MemoryProfileStore>) -> SwarmDeps {
        SwarmDeps {
            backend,
            convo_store: Some(Arc::new(MemoryConvoStore::new())),
            profile_store: profiles,
            analyst_registry: Arc::new(ToolRegistry::new()),
            data_guy_registry: Arc::new(ToolRegistry::new()),
            run_options: RunOptions::new(Duration::from_millis(1), 5),
        }
    }

    #[tokio::test]
    async fn test_happy_path_single_data_guy() {
        // Creation order: analyst = asst_1 / thread_1, scratch thread_2,
        // data guy = asst_2 / thread_3
        let backend = Arc::new(WorkflowBackend::new(vec![
            ("asst_1", "Fetch Boston lineup stats"),
            ("asst_2", "Stored lineups, doc_id abc. Boston starters: +9.8 net."),
            ("asst_1", "Yes, the data answers the question."),
            ("asst_1", "Boston's starting five outscored opponents by 9.8."),
        ]));
        let deps = deps(backend.clone(), seeded_profiles().await);

        let analysis = run_analyst(&deps, "c1", "How good are Boston's starters?")
            .await
            .unwrap();
        assert_eq!(analysis, "Boston's starting five outscored opponents by 9.8.");

        // The fan-out is narrated on the analyst thread in its own voice
        let analyst_posts = backend.posts_to("thread_1");
        assert!(analyst_posts.contains(&(
            Role::Assistant,
            "nba_data_guy_1: Fetch Boston lineup stats\n".to_string()
        )));

        // The data guy got exactly the rewritten request
        let data_posts = backend.posts_to("thread_3");
        assert_eq!(
            data_posts,
            vec![(Role::User, "Fetch Boston lineup stats".to_string())]
        );

        // Both assistants were retired, analyst first
        assert_eq!(
            backend.deleted.lock().unwrap().clone(),
            vec!["asst_1".to_string(), "asst_2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_follow_up_round_when_evaluation_says_no() {
        let backend = Arc::new(WorkflowBackend::new(vec![
            ("asst_1", "Fetch Boston lineup stats"),
            ("asst_2", "No lineups found."),
            ("asst_1", "No, there is no lineup data yet."),
            ("asst_1", "Please fetch Boston hustle stats instead"),
            ("asst_2", "Stored hustle stats, doc_id xyz."),
            ("asst_1", "Yes, this is enough."),
            ("asst_1", "Boston leads the league in deflections."),
        ]));
        let deps = deps(backend.clone(), seeded_profiles().await);

        let analysis = run_analyst(&deps, "c2", "Does Boston hustle?").await.unwrap();
        assert_eq!(analysis, "Boston leads the league in deflections.");

        // The same data guy session served both rounds
        let data_posts = backend.posts_to("thread_3");
        assert_eq!(
            data_posts,
            vec![
                (Role::User, "Fetch Boston lineup stats".to_string()),
                (Role::User, "Please fetch Boston hustle stats instead".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_approval_on_final_allowed_round_still_analyzes() {
        // Evaluation rejects the data until the last permitted follow-up
        // round, where it approves; the workflow must treat that as a
        // normal pass and produce the analysis.
        let mut replies = vec![
            ("asst_1", "Fetch Boston lineup stats"),
            ("asst_2", "No data."),
            ("asst_1", "No, nothing usable yet."),
        ];
        for _ in 0..4 {
            replies.push(("asst_1", "Try the lineups endpoint again"));
            replies.push(("asst_2", "Still nothing."));
            replies.push(("asst_1", "No, still insufficient."));
        }
        replies.push(("asst_1", "Try the lineups endpoint again"));
        replies.push(("asst_2", "Found the lineups, doc_id abc."));
        replies.push(("asst_1", "Yes, finally sufficient."));
        replies.push(("asst_1", "Boston's starters are elite."));

        let backend = Arc::new(WorkflowBackend::new(replies));
        let deps = deps(backend.clone(), seeded_profiles().await);

        let analysis = run_analyst(&deps, "c4", "How good are Boston's starters?")
            .await
            .unwrap();
        assert_eq!(analysis, "Boston's starters are elite.");

        // Initial request plus all five follow-ups reached the data guy
        assert_eq!(backend.posts_to("thread_3").len(), 6);
    }

    #[tokio::test]
    async fn test_planning_step_posts_template_and_returns_breakdown() {
        let backend = Arc::new(WorkflowBackend::new(vec![(
            "asst_1",
            "1. Net rating for Boston's starting five.",
        )]));
        let deps = deps(backend.clone(), seeded_profiles().await);

        let mut swarm = Swarm::assemble(&deps, "c5").await.unwrap();
        let breakdown = swarm.planning_step().await.unwrap();
        assert_eq!(breakdown, "1. Net rating for Boston's starting five.");

        let analyst_posts = backend.posts_to("thread_1");
        assert_eq!(analyst_posts, vec![(Role::User, PLANNING.to_string())]);
        swarm.shutdown().await;
    }

    #[test]
    fn test_approved_is_case_insensitive_and_strict_on_no() {
        assert!(approved("Yes, this answers it."));
        assert!(approved("yes"));
        assert!(!approved("No, fetch more data."));
        assert!(!approved(""));
    }

    #[tokio::test]
    async fn test_assemble_requires_stored_profiles() {
        let backend = Arc::new(WorkflowBackend::new(Vec::new()));

        // Nothing seeded at all
        let empty = deps(backend.clone(), Arc::new(MemoryProfileStore::new()));
        let err = run_analyst(&empty, "c3", "anything").await.unwrap_err();
        assert!(matches!(err, AnalystError::Workflow(_)));

        // Analyst seeded, but no data guys
        let store = Arc::new(MemoryProfileStore::new());
        store.upsert(&analyst_profile("gpt-4o")).await.unwrap();
        let no_guys = deps(backend.clone(), store);
        let err = run_analyst(&no_guys, "c3", "anything").await.unwrap_err();
        assert!(err.to_string().contains("no nba_data_guy profiles"));

        // No assistants were created for either failure
        assert!(backend.assistants.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sourcing_tools_text_drops_lookup() {
        let tools = vec![
            json!({"type": "function", "function": {"name": "get_lineups"}}),
            json!({"type": "function", "function": {"name": "data_lookup"}}),
        ];
        let text = sourcing_tools_text(&tools).unwrap();
        assert!(text.contains("get_lineups"));
        assert!(!text.contains("data_lookup"));
    }
}
