//! Mock Stats Source
//!
//! For testing and demo purposes. Returns realistic static rows shaped
//! like the live host's output.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Endpoint, StatParams, StatsSource};
use crate::error::{AnalystError, Result};

/// Stats source with canned rows per endpoint
pub struct MockStatsSource {
    overrides: Mutex<HashMap<Endpoint, Vec<Value>>>,
    failing: bool,
}

impl Default for MockStatsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStatsSource {
    pub fn new() -> Self {
        Self {
            overrides: Mutex::new(HashMap::new()),
            failing: false,
        }
    }

    /// Source whose every fetch fails, for error-path tests
    pub fn failing() -> Self {
        Self {
            overrides: Mutex::new(HashMap::new()),
            failing: true,
        }
    }

    /// Replace the canned rows for one endpoint
    pub fn with_rows(self, endpoint: Endpoint, rows: Vec<Value>) -> Self {
        self.overrides.lock().unwrap().insert(endpoint, rows);
        self
    }

    fn canned(endpoint: Endpoint) -> Vec<Value> {
        match endpoint {
            Endpoint::LeagueDashLineups => vec![
                json!({
                    "GROUP_NAME": "J. Brown - J. Holiday - A. Horford - J. Tatum - D. White",
                    "TEAM_ID": 1610612738,
                    "TEAM_ABBREVIATION": "BOS",
                    "GP": 41, "W": 33, "L": 8, "W_PCT": 0.805,
                    "MIN": 724.5, "PLUS_MINUS": 9.8, "PTS": 118.2
                }),
                json!({
                    "GROUP_NAME": "S. Hauser - L. Kornet - P. Pritchard - N. Queta - J. Walsh",
                    "TEAM_ID": 1610612738,
                    "TEAM_ABBREVIATION": "BOS",
                    "GP": 2, "W": 1, "L": 1, "W_PCT": 0.5,
                    "MIN": 0.4, "PLUS_MINUS": -2.0, "PTS": 4.0
                }),
            ],
            Endpoint::LeagueHustleStatsTeam => vec![
                json!({
                    "TEAM_ID": 1610612738, "TEAM_NAME": "Boston Celtics",
                    "MIN": 48.2, "CONTESTED_SHOTS": 58.1, "DEFLECTIONS": 16.2,
                    "CHARGES_DRAWN": 0.4, "SCREEN_ASSISTS": 9.7, "BOX_OUTS": 27.3
                }),
                json!({
                    "TEAM_ID": 1610612747, "TEAM_NAME": "Los Angeles Lakers",
                    "MIN": 48.4, "CONTESTED_SHOTS": 55.6, "DEFLECTIONS": 14.9,
                    "CHARGES_DRAWN": 0.5, "SCREEN_ASSISTS": 10.9, "BOX_OUTS": 25.8
                }),
            ],
            Endpoint::LeagueDashPlayerClutch => vec![
                json!({
                    "PLAYER_ID": 1628369, "PLAYER_NAME": "Jayson Tatum",
                    "TEAM_ID": 1610612738, "TEAM_ABBREVIATION": "BOS",
                    "GP": 29, "MIN": 3.4, "PTS": 3.9, "FG_PCT": 0.451, "PLUS_MINUS": 1.2
                }),
                json!({
                    "PLAYER_ID": 203507, "PLAYER_NAME": "Giannis Antetokounmpo",
                    "TEAM_ID": 1610612749, "TEAM_ABBREVIATION": "MIL",
                    "GP": 34, "MIN": 3.8, "PTS": 4.4, "FG_PCT": 0.562, "PLUS_MINUS": 0.8
                }),
            ],
            Endpoint::LeagueDashPlayerStats => vec![
                json!({
                    "PLAYER_ID": 1628369, "PLAYER_NAME": "Jayson Tatum",
                    "TEAM_ID": 1610612738, "AGE": 25, "GP": 74,
                    "MIN": 35.7, "PTS": 26.9, "REB": 8.1, "AST": 4.9
                }),
                json!({
                    "PLAYER_ID": 203999, "PLAYER_NAME": "Nikola Jokic",
                    "TEAM_ID": 1610612743, "AGE": 28, "GP": 79,
                    "MIN": 34.6, "PTS": 26.4, "REB": 12.4, "AST": 9.0
                }),
            ],
        }
    }
}

#[async_trait]
impl StatsSource for MockStatsSource {
    async fn fetch(&self, endpoint: Endpoint, _params: &StatParams) -> Result<Vec<Value>> {
        if self.failing {
            return Err(AnalystError::StatsApi("mock source configured to fail".into()));
        }
        if let Some(rows) = self.overrides.lock().unwrap().get(&endpoint) {
            return Ok(rows.clone());
        }
        Ok(Self::canned(endpoint))
    }

    fn name(&self) -> &str {
        "MockStats"
    }
}
