//! # nba-analyst
//!
//! Multi-agent NBA statistics analyst. One orchestrating analyst agent
//! decomposes a basketball question, delegates data sourcing to data-guy
//! agents equipped with stats tools, then evaluates and summarizes what
//! came back.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  user question                                               │
//! │      │                                                       │
//! │      ▼                                                       │
//! │  nba_analyst ── rewrite per data guy ──► data request(s)     │
//! │      │                                                       │
//! │      ▼                                                       │
//! │  nba_data_guy_N ── get_lineups / get_hustle_stats_team /     │
//! │      │             get_player_clutch_stats / get_player_stats│
//! │      │             └─► fact batches (doc_id-tagged rows)     │
//! │      │             data_lookup ◄── filter one batch          │
//! │      ▼                                                       │
//! │  nba_analyst ── evaluate ──► follow up? ──► final analysis   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sourced rows land in a fact store as independent documents sharing a
//! batch id, so the lookup tool can slice exactly one fetch's worth of
//! data for the model without refetching.

pub mod error;
pub mod model;
pub mod profiles;
pub mod prompts;
pub mod stats;
pub mod svckit;
pub mod workflow;

pub use error::{AnalystError, Result};
pub use model::{team_name, SEASON};
pub use profiles::{
    analyst_profile, data_guy_profile, seed_defaults, ANALYST_NAME, DATA_GUY_NAME, ORG,
};
pub use stats::{Endpoint, MockStatsSource, NbaStatsClient, StatParams, StatsSource};
pub use workflow::{run_analyst, Swarm, SwarmDeps};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        data_guy_registry, DataLookupTool, PlayerClutchTool, PlayerStatsTool, TeamHustleTool,
        TeamLineupsTool,
    };
}
