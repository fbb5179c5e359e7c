//! Service Kit - Agent Tools
//!
//! Domain-specific tools that implement `agent_core::Tool` for the NBA
//! data agents.

mod clutch;
mod data_lookup;
mod hustle;
mod ingest;
mod lineups;
mod player_stats;

pub use clutch::PlayerClutchTool;
pub use data_lookup::DataLookupTool;
pub use hustle::TeamHustleTool;
pub use ingest::StatIngestor;
pub use lineups::TeamLineupsTool;
pub use player_stats::PlayerStatsTool;

use std::sync::Arc;

use agent_core::{FactStore, ToolRegistry};

use crate::stats::StatsSource;

/// Registry carrying the full data-guy toolset
///
/// Four sourcing tools plus the lookup counterpart, all sharing one
/// stats source and one fact store.
pub fn data_guy_registry(source: Arc<dyn StatsSource>, facts: Arc<dyn FactStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(TeamLineupsTool::new(source.clone(), facts.clone()));
    registry.register(TeamHustleTool::new(source.clone(), facts.clone()));
    registry.register(PlayerClutchTool::new(source.clone(), facts.clone()));
    registry.register(PlayerStatsTool::new(source, facts.clone()));
    registry.register(DataLookupTool::new(facts));
    registry
}
