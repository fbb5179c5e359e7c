//! Team Hustle Stats Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_core::{FactStore, Result as CoreResult, Tool, ToolSchema};

use super::ingest::StatIngestor;
use crate::stats::{Endpoint, StatParams, StatsSource};

/// Tool sourcing per-game team hustle stats
pub struct TeamHustleTool {
    ingest: StatIngestor,
}

impl TeamHustleTool {
    pub fn new(source: Arc<dyn StatsSource>, facts: Arc<dyn FactStore>) -> Self {
        Self {
            ingest: StatIngestor::new(source, facts),
        }
    }
}

#[async_trait]
impl Tool for TeamHustleTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_hustle_stats_team".into(),
            description: "Get team hustle stats, per game. Expected columns include TEAM_ID, \
                          TEAM_NAME, MIN, CONTESTED_SHOTS, DEFLECTIONS, CHARGES_DRAWN, \
                          SCREEN_ASSISTS, LOOSE_BALLS_RECOVERED and BOX_OUTS."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "team_id": {
                        "type": "string",
                        "description": "Stats API team id to scope the stats to one team. Omit for the whole league."
                    }
                },
                "required": []
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> CoreResult<String> {
        let mut params = StatParams::for_season().with_per_mode("PerGame");
        if let Some(team_id) = arguments.get("team_id").and_then(Value::as_str) {
            params = params.with_team_id(team_id);
        }

        Ok(self
            .ingest
            .fetch_and_store(
                Endpoint::LeagueHustleStatsTeam,
                &params,
                None,
                "No hustle stats found.",
            )
            .await)
    }
}
