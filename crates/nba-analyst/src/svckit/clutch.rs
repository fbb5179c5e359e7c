//! Player Clutch Stats Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use agent_core::{FactStore, Result as CoreResult, Tool, ToolSchema};

use super::ingest::StatIngestor;
use crate::stats::{Endpoint, StatParams, StatsSource};

/// Tool sourcing player performance in clutch time
pub struct PlayerClutchTool {
    ingest: StatIngestor,
}

impl PlayerClutchTool {
    pub fn new(source: Arc<dyn StatsSource>, facts: Arc<dyn FactStore>) -> Self {
        Self {
            ingest: StatIngestor::new(source, facts),
        }
    }
}

#[async_trait]
impl Tool for PlayerClutchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::no_args(
            "get_player_clutch_stats",
            "Get player clutch stats: performance in the last five minutes of close games. \
             Expected columns include PLAYER_ID, PLAYER_NAME, TEAM_ID, TEAM_ABBREVIATION, AGE, \
             GP, W, L, MIN, PTS, FG_PCT, PLUS_MINUS and their league ranks.",
        )
    }

    async fn execute(&self, _arguments: &Value) -> CoreResult<String> {
        Ok(self
            .ingest
            .fetch_and_store(
                Endpoint::LeagueDashPlayerClutch,
                &StatParams::for_season(),
                None,
                "No player clutch stats found.",
            )
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::MockStatsSource;
    use agent_core::MemoryFactStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_clutch_batch_summary() {
        let tool =
            PlayerClutchTool::new(Arc::new(MockStatsSource::new()), MemoryFactStore::shared());

        let output = tool.execute(&json!({})).await.unwrap();
        assert!(output.starts_with("player_clutch_stats info added to DB with doc_id: "));
    }

    #[tokio::test]
    async fn test_clutch_empty_sentinel() {
        let source =
            MockStatsSource::new().with_rows(Endpoint::LeagueDashPlayerClutch, Vec::new());
        let tool = PlayerClutchTool::new(Arc::new(source), MemoryFactStore::shared());

        let output = tool.execute(&json!({})).await.unwrap();
        assert_eq!(output, "No player clutch stats found.");
    }
}
