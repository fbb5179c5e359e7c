//! Player Season Stats Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use agent_core::{FactStore, Result as CoreResult, Tool, ToolSchema};

use super::ingest::StatIngestor;
use crate::stats::{Endpoint, StatParams, StatsSource};

/// Tool sourcing season performance stats for every player
pub struct PlayerStatsTool {
    ingest: StatIngestor,
}

impl PlayerStatsTool {
    pub fn new(source: Arc<dyn StatsSource>, facts: Arc<dyn FactStore>) -> Self {
        Self {
            ingest: StatIngestor::new(source, facts),
        }
    }
}

#[async_trait]
impl Tool for PlayerStatsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::no_args(
            "get_player_stats",
            "Get season performance stats for all players. Also the way to find a player's \
             PLAYER_ID for use in other functions. Expected columns include PLAYER_ID, \
             PLAYER_NAME, TEAM_ID, AGE, GP, MIN, PTS, REB, AST, FG_PCT and PLUS_MINUS.",
        )
    }

    async fn execute(&self, _arguments: &Value) -> CoreResult<String> {
        Ok(self
            .ingest
            .fetch_and_store(
                Endpoint::LeagueDashPlayerStats,
                &StatParams::for_season(),
                None,
                "Could not retrieve player stats.",
            )
            .await)
    }
}
