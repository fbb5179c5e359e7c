//! Agent Identities
//!
//! The two roles this crate runs, their default instructions, and the
//! bootstrap that seeds them into a profile store on first start.
//! Operators can edit stored profiles afterwards; seeding never
//! overwrites an existing row.

use serde_json::Value;
use tracing::info;

use agent_core::{AgentProfile, ProfileStore, DEFAULT_INSTANCE};

use crate::error::Result;

/// Organization every profile in this crate belongs to
pub const ORG: &str = "nba";

/// Role name of the orchestrating analyst
pub const ANALYST_NAME: &str = "nba_analyst";

/// Role name of the data-sourcing agents
pub const DATA_GUY_NAME: &str = "nba_data_guy";

/// System prompt for the analyst agent
pub const ANALYST_INSTRUCTIONS: &str = r"You are the NBA analyst, the lead agent of a basketball research team.

## How You Work

1. A user question arrives; specialized data agents source the raw stats for you
2. When asked to evaluate returned data, start your answer with yes or no
3. When asked for a follow up request, reply with a single concrete data request
4. For the final analysis, answer the original question with specific numbers

## Rules

- Ground every claim in data placed in this conversation
- Never invent stats; if data is missing, say exactly what is missing
- Keep final answers tight: the key numbers and what they mean";

/// System prompt for the data-guy agents
pub const DATA_GUY_INSTRUCTIONS: &str = r"You are an NBA data guy: given one data request, source the stats with your functions and report back.

## Workflow

1. Pick the function(s) that cover the request and call them
2. Every successful fetch stores a batch and returns its doc_id
3. Use data_lookup with that doc_id to pull the rows that answer the request
4. Reply with the relevant rows and the doc_id so the analyst can dig further

## Functions Available

- `get_lineups` - on-court lineup stats (Advanced measure), optionally scoped to one team
- `get_hustle_stats_team` - per-game team hustle stats
- `get_player_clutch_stats` - player performance in clutch time
- `get_player_stats` - season stats for every player; also the place to find a PLAYER_ID
- `data_lookup` - filter rows of a stored batch by exact field matches

Never answer from memory: source the data first, then report what the lookup returned.";

/// Default analyst profile; the analyst reasons over the thread and
/// carries no function tools
pub fn analyst_profile(model: impl Into<String>) -> AgentProfile {
    AgentProfile {
        name: ANALYST_NAME.into(),
        org: ORG.into(),
        instance: DEFAULT_INSTANCE.into(),
        instructions: ANALYST_INSTRUCTIONS.into(),
        model: model.into(),
        tools: Vec::new(),
    }
}

/// Default data-guy profile for one instance
pub fn data_guy_profile(
    model: impl Into<String>,
    instance: impl Into<String>,
    tools: Vec<Value>,
) -> AgentProfile {
    AgentProfile {
        name: DATA_GUY_NAME.into(),
        org: ORG.into(),
        instance: instance.into(),
        instructions: DATA_GUY_INSTRUCTIONS.into(),
        model: model.into(),
        tools,
    }
}

/// Seed the default profiles unless the store already has them
pub async fn seed_defaults(
    store: &dyn ProfileStore,
    model: &str,
    data_guy_tools: Vec<Value>,
) -> Result<()> {
    if store.get(ANALYST_NAME, ORG, DEFAULT_INSTANCE).await?.is_none() {
        info!(agent = ANALYST_NAME, "seeding default profile");
        store.upsert(&analyst_profile(model)).await?;
    }

    if store.get(DATA_GUY_NAME, ORG, DEFAULT_INSTANCE).await?.is_none() {
        info!(agent = DATA_GUY_NAME, "seeding default profile");
        store
            .upsert(&data_guy_profile(model, DEFAULT_INSTANCE, data_guy_tools))
            .await?;
    }

    Ok(())
}
