//! Fetch-and-Store Pipeline
//!
//! Shared path behind the four stats tools: fetch an endpoint, tag
//! every surviving row with a fresh batch id and capture timestamp,
//! insert the batch, and summarize the outcome for the model. The
//! summary deliberately carries only the batch id and one example row
//! so it stays small enough for the orchestrating model's context.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use uuid::Uuid;

use agent_core::FactStore;

use crate::stats::{Endpoint, StatParams, StatsSource};

/// Fetches one endpoint and lands the rows as a tagged fact batch
#[derive(Clone)]
pub struct StatIngestor {
    source: Arc<dyn StatsSource>,
    facts: Arc<dyn FactStore>,
}

impl StatIngestor {
    pub fn new(source: Arc<dyn StatsSource>, facts: Arc<dyn FactStore>) -> Self {
        Self { source, facts }
    }

    /// Run the full pipeline, always answering with model-facing text
    ///
    /// A failed fetch and an empty result both collapse to `empty_msg`;
    /// only a store failure after a successful fetch gets its own
    /// message. Rows below `min_minutes` of playing time are dropped
    /// before anything is written.
    pub async fn fetch_and_store(
        &self,
        endpoint: Endpoint,
        params: &StatParams,
        min_minutes: Option<f64>,
        empty_msg: &str,
    ) -> String {
        let label = endpoint.label();

        let mut rows = match self.source.fetch(endpoint, params).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(endpoint = label, source = self.source.name(), error = %e, "stats fetch failed");
                return empty_msg.to_string();
            }
        };

        if let Some(min) = min_minutes {
            rows.retain(|row| {
                row.get("MIN")
                    .and_then(Value::as_f64)
                    .is_some_and(|minutes| minutes >= min)
            });
        }

        if rows.is_empty() {
            return empty_msg.to_string();
        }

        let doc_id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339();
        for row in &mut rows {
            if let Some(object) = row.as_object_mut() {
                object.insert("createdAt".to_string(), json!(created_at));
                object.insert("doc_id".to_string(), json!(doc_id));
            }
        }

        let example = rows[0].to_string();
        debug!(endpoint = label, "schema example: {example}");

        match self.facts.insert_rows(rows).await {
            Ok(inserted) => {
                info!(endpoint = label, inserted, doc_id, "stored stats batch");
                format!(
                    "{label} info added to DB with doc_id: {doc_id}\n\nExample entry:\n{example}\n\n\
                     NEXT STEP: You have successfully added the {label} info to the database. Using \
                     the info above you can now use the data_lookup function to query the data."
                )
            }
            Err(e) => {
                error!(endpoint = label, error = %e, "failed to store stats batch");
                format!("Failed to add {label} info to DB.")
            }
        }
    }
}
