//! Lineups Tool
//!
//! Sources on-court lineup stats, advanced measure, and lands them as a
//! fact batch. Lineups that barely played are noise for analysis, so
//! anything under a minute of floor time is dropped before storage.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use agent_core::{FactStore, Result as CoreResult, Tool, ToolSchema};

use super::ingest::StatIngestor;
use crate::model::team_name;
use crate::stats::{Endpoint, StatParams, StatsSource};

const MIN_LINEUP_MINUTES: f64 = 1.0;

/// Tool sourcing team lineup stats
pub struct TeamLineupsTool {
    ingest: StatIngestor,
}

impl TeamLineupsTool {
    pub fn new(source: Arc<dyn StatsSource>, facts: Arc<dyn FactStore>) -> Self {
        Self {
            ingest: StatIngestor::new(source, facts),
        }
    }
}

#[async_trait]
impl Tool for TeamLineupsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_lineups".into(),
            description: "Get lineup stats. Sources data relating to on-court lineups, using the \
                          Advanced measure. Expected columns include GROUP_NAME, TEAM_ID, \
                          TEAM_ABBREVIATION, GP, W, L, W_PCT, MIN, PTS, PLUS_MINUS and their \
                          league ranks."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "team_id": {
                        "type": "string",
                        "description": "Stats API team id to scope lineups to one team, e.g. 1610612738 for the Boston Celtics. Omit for the whole league."
                    }
                },
                "required": []
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> CoreResult<String> {
        let mut params = StatParams::for_season().with_measure_type("Advanced");
        if let Some(team_id) = arguments.get("team_id").and_then(Value::as_str) {
            info!(
                team_id,
                team = team_name(team_id).unwrap_or("unknown team"),
                "fetching lineups"
            );
            params = params.with_team_id(team_id);
        }

        Ok(self
            .ingest
            .fetch_and_store(
                Endpoint::LeagueDashLineups,
                &params,
                Some(MIN_LINEUP_MINUTES),
                "No lineups found.",
            )
            .await)
    }
}
