//! Agent Profiles
//!
//! Stored definitions of the agents an organization runs: instructions,
//! model, and advertised tools. Sessions are created from profiles so a
//! deployment can tune an agent without a code change.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::Result;

/// Default instance label for singleton agents
pub const DEFAULT_INSTANCE: &str = "1";

/// A stored agent definition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Role name (e.g., "nba_analyst")
    pub name: String,

    /// Organization the profile belongs to
    pub org: String,

    /// Distinguishes multiple instances of the same role
    #[serde(default = "default_instance")]
    pub instance: String,

    /// System instructions for the remote assistant
    pub instructions: String,

    /// Model identifier
    pub model: String,

    /// Wire-format tool definitions advertised at assistant creation
    #[serde(default)]
    pub tools: Vec<Value>,
}

fn default_instance() -> String {
    DEFAULT_INSTANCE.into()
}

impl AgentProfile {
    /// Name qualified with the instance label (e.g., "nba_data_guy_2")
    pub fn instance_name(&self) -> String {
        format!("{}_{}", self.name, self.instance)
    }
}

/// Storage seam for agent profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch one profile by role, org, and instance
    async fn get(&self, name: &str, org: &str, instance: &str) -> Result<Option<AgentProfile>>;

    /// All instances of a role within an org, ordered by instance label
    async fn list(&self, name: &str, org: &str) -> Result<Vec<AgentProfile>>;

    /// Insert or replace a profile
    async fn upsert(&self, profile: &AgentProfile) -> Result<()>;
}

/// In-memory profile store for tests and single-process runs
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<(String, String, String), AgentProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, name: &str, org: &str, instance: &str) -> Result<Option<AgentProfile>> {
        let profiles = self.profiles.lock().await;
        Ok(profiles
            .get(&(name.to_string(), org.to_string(), instance.to_string()))
            .cloned())
    }

    async fn list(&self, name: &str, org: &str) -> Result<Vec<AgentProfile>> {
        let profiles = self.profiles.lock().await;
        let mut matched: Vec<AgentProfile> = profiles
            .values()
            .filter(|p| p.name == name && p.org == org)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.instance.cmp(&b.instance));
        Ok(matched)
    }

    async fn upsert(&self, profile: &AgentProfile) -> Result<()> {
        let mut profiles = self.profiles.lock().await;
        profiles.insert(
            (
                profile.name.clone(),
                profile.org.clone(),
                profile.instance.clone(),
            ),
            profile.clone(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, instance: &str) -> AgentProfile {
        AgentProfile {
            name: name.into(),
            org: "nba".into(),
            instance: instance.into(),
            instructions: "You are a helpful analyst.".into(),
            model: "gpt-4o".into(),
            tools: Vec::new(),
        }
    }

    #[test]
    fn test_instance_name() {
        assert_eq!(profile("nba_data_guy", "2").instance_name(), "nba_data_guy_2");
    }

    #[tokio::test]
    async fn test_get_and_upsert() {
        let store = MemoryProfileStore::new();
        store.upsert(&profile("nba_analyst", "1")).await.unwrap();

        let found = store.get("nba_analyst", "nba", "1").await.unwrap();
        assert!(found.is_some());
        assert!(store.get("nba_analyst", "nba", "2").await.unwrap().is_none());
        assert!(
            store
                .get("nba_analyst", "other_org", "1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_orders_by_instance() {
        let store = MemoryProfileStore::new();
        store.upsert(&profile("nba_data_guy", "2")).await.unwrap();
        store.upsert(&profile("nba_data_guy", "1")).await.unwrap();
        store.upsert(&profile("nba_analyst", "1")).await.unwrap();

        let guys = store.list("nba_data_guy", "nba").await.unwrap();
        assert_eq!(guys.len(), 2);
        assert_eq!(guys[0].instance, "1");
        assert_eq!(guys[1].instance, "2");
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = MemoryProfileStore::new();
        store.upsert(&profile("nba_analyst", "1")).await.unwrap();

        let mut updated = profile("nba_analyst", "1");
        updated.model = "gpt-4o-mini".into();
        store.upsert(&updated).await.unwrap();

        let found = store.get("nba_analyst", "nba", "1").await.unwrap().unwrap();
        assert_eq!(found.model, "gpt-4o-mini");
    }
}
