//! # nba-swarm
//!
//! Deployment wiring for the NBA analyst swarm. Reads configuration from
//! the environment, opens the SQLite store, assembles the tool registries
//! per agent role, seeds default agent profiles on first start, and hands
//! the finished [`SwarmDeps`] to the binaries: `nba-swarm` (interactive
//! CLI) and `swarm-worker` (queue ingress).

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AssistantBackend, ConvoStore, FactStore, ProfileStore, RunOptions, ToolRegistry};
use agent_runtime::OpenAiAssistants;
use agent_store::SqliteStore;
use nba_analyst::tools::data_guy_registry;
use nba_analyst::{seed_defaults, NbaStatsClient, StatsSource, SwarmDeps};

pub const DEFAULT_DB_PATH: &str = "swarm.db";
pub const DEFAULT_NATS_URL: &str = "nats://127.0.0.1:4222";
pub const DEFAULT_SUBJECT: &str = "swarm.analyst.request";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Deployment configuration, read from the environment
#[derive(Clone, Debug)]
pub struct SwarmConfig {
    /// Path of the SQLite database file
    pub db_path: String,

    /// False in testing mode: conversation appends succeed without writing
    pub persist_convos: bool,

    /// NATS server the worker connects to
    pub nats_url: String,

    /// Subject the worker consumes analyst requests from
    pub subject: String,

    /// Model seeded into new agent profiles
    pub model: String,
}

impl SwarmConfig {
    /// Read `SWARM_DB_PATH`, `SWARM_MODE`, `SWARM_NATS_URL`,
    /// `SWARM_SUBJECT`, and `SWARM_MODEL`, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("SWARM_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.into()),
            persist_convos: persist_from_mode(std::env::var("SWARM_MODE").ok().as_deref()),
            nats_url: std::env::var("SWARM_NATS_URL").unwrap_or_else(|_| DEFAULT_NATS_URL.into()),
            subject: std::env::var("SWARM_SUBJECT").unwrap_or_else(|_| DEFAULT_SUBJECT.into()),
            model: std::env::var("SWARM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
        }
    }
}

/// Testing mode turns conversation persistence off; any other mode keeps it
fn persist_from_mode(mode: Option<&str>) -> bool {
    !matches!(mode, Some("testing"))
}

/// Install the tracing subscriber the binaries share
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Assemble everything the analyst workflow needs
///
/// One store handle serves all three persistence seams; the live stats
/// client feeds the data-guy toolkit. Default profiles are seeded so a
/// fresh database is immediately usable, and existing profiles are left
/// exactly as the operator last saved them.
pub async fn build_deps(config: &SwarmConfig) -> anyhow::Result<SwarmDeps> {
    let backend: Arc<dyn AssistantBackend> =
        Arc::new(OpenAiAssistants::from_env().context("assistant backend configuration")?);

    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    let facts: Arc<dyn FactStore> = store.clone();
    let profile_store: Arc<dyn ProfileStore> = store.clone();
    let convo_store: Option<Arc<dyn ConvoStore>> = if config.persist_convos {
        Some(store)
    } else {
        info!("testing mode: conversation persistence disabled");
        None
    };

    let source: Arc<dyn StatsSource> = Arc::new(NbaStatsClient::new()?);
    let registry = Arc::new(data_guy_registry(source, facts));
    info!(tools = registry.len(), "data guy toolkit assembled");

    seed_defaults(profile_store.as_ref(), &config.model, registry.wire_schemas()).await?;

    Ok(SwarmDeps {
        backend,
        convo_store,
        profile_store,
        analyst_registry: Arc::new(ToolRegistry::new()),
        data_guy_registry: registry,
        run_options: RunOptions::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_testing_mode_disables_persistence() {
        assert!(persist_from_mode(None));
        assert!(persist_from_mode(Some("production")));
        assert!(persist_from_mode(Some("")));
        assert!(!persist_from_mode(Some("testing")));
    }
}
