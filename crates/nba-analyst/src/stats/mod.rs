//! Stats Source Integration
//!
//! Abstractions and implementations for the league stats API.

mod mock;
mod nba_client;

pub use mock::MockStatsSource;
pub use nba_client::NbaStatsClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::model::SEASON;

/// The stats API endpoints the data tools draw from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    LeagueDashLineups,
    LeagueHustleStatsTeam,
    LeagueDashPlayerClutch,
    LeagueDashPlayerStats,
}

impl Endpoint {
    /// URL path segment on the stats host
    pub fn path(self) -> &'static str {
        match self {
            Self::LeagueDashLineups => "leaguedashlineups",
            Self::LeagueHustleStatsTeam => "leaguehustlestatsteam",
            Self::LeagueDashPlayerClutch => "leaguedashplayerclutch",
            Self::LeagueDashPlayerStats => "leaguedashplayerstats",
        }
    }

    /// Short label used in stored batches and tool messages
    pub fn label(self) -> &'static str {
        match self {
            Self::LeagueDashLineups => "lineups",
            Self::LeagueHustleStatsTeam => "hustle_stats_team",
            Self::LeagueDashPlayerClutch => "player_clutch_stats",
            Self::LeagueDashPlayerStats => "player_stats",
        }
    }
}

/// Normalized request parameters shared by every endpoint
///
/// Endpoints that need more than this (clutch windows, lineup group
/// size) get fixed defaults from the client; these are the knobs the
/// tools actually turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatParams {
    pub season: String,
    pub per_mode: Option<String>,
    pub measure_type: Option<String>,
    pub team_id: Option<String>,
}

impl StatParams {
    /// Parameters pinned to the configured season, nothing else set
    pub fn for_season() -> Self {
        Self {
            season: SEASON.to_string(),
            per_mode: None,
            measure_type: None,
            team_id: None,
        }
    }

    pub fn with_per_mode(mut self, per_mode: impl Into<String>) -> Self {
        self.per_mode = Some(per_mode.into());
        self
    }

    pub fn with_measure_type(mut self, measure_type: impl Into<String>) -> Self {
        self.measure_type = Some(measure_type.into());
        self
    }

    pub fn with_team_id(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }
}

/// Stats source trait (Strategy pattern)
///
/// Implement this for each upstream: the live stats API, fixtures, a
/// future local mirror.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch one endpoint's tabular result as a list of row objects
    async fn fetch(&self, endpoint: Endpoint, params: &StatParams) -> Result<Vec<Value>>;

    /// Source name for logs
    fn name(&self) -> &str;
}
