//! # agent-store
//!
//! SQLite-backed implementations of the agent-core storage seams: one
//! embedded database file holds conversation records, fact documents,
//! and agent profiles. Swarm deployments share a single [`SqliteStore`]
//! behind `Arc` across all three trait views.

pub mod sqlite;

pub use sqlite::SqliteStore;
