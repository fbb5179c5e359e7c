//! Data Lookup Tool
//!
//! Read side of the fact cache: filters one stored batch by exact field
//! matches, with optional sort and limit. Query mistakes are fed back
//! through the tool output instead of failing the run, so the model can
//! correct itself and retry.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use agent_core::{FactFilter, FactQuery, FactSort, FactStore, Result as CoreResult, Tool, ToolSchema};

use crate::error::AnalystError;

const NO_RESULTS_MSG: &str =
    "This query returned no results. Please double check that your query is setup correctly.";

/// Tool querying previously stored fact batches
pub struct DataLookupTool {
    facts: Arc<dyn FactStore>,
}

impl DataLookupTool {
    pub fn new(facts: Arc<dyn FactStore>) -> Self {
        Self { facts }
    }
}

#[async_trait]
impl Tool for DataLookupTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "data_lookup".into(),
            description: "Look up data previously added to the database. Filters the rows of one \
                          batch by exact field matches."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "doc_id": {
                        "type": "string",
                        "description": "The doc_id returned when the data was added to the database."
                    },
                    "query": {
                        "type": "string",
                        "description": "JSON object of field/value pairs each row must match exactly, e.g. {\"TEAM_ABBREVIATION\": \"BOS\"}. Use {} for every row in the batch."
                    },
                    "sort_by": {
                        "type": "string",
                        "description": "Field to order the results by."
                    },
                    "descending": {
                        "type": "boolean",
                        "description": "Sort highest values first. Defaults to false."
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of rows to return."
                    }
                },
                "required": ["doc_id", "query"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> CoreResult<String> {
        let doc_id = arguments
            .get("doc_id")
            .and_then(Value::as_str)
            .ok_or_else(|| AnalystError::BadArguments("doc_id is required".into()))?;
        let query_str = arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| AnalystError::BadArguments("query is required".into()))?;
        info!(doc_id, query = query_str, "looking up data");

        let results = match serde_json::from_str::<FactFilter>(query_str) {
            Ok(mut filter) => {
                // Scope to the batch even when the model left it out of the filter
                filter.insert("doc_id".into(), json!(doc_id));

                let query = FactQuery {
                    filter,
                    sort: arguments
                        .get("sort_by")
                        .and_then(Value::as_str)
                        .map(|field| FactSort {
                            field: field.to_string(),
                            descending: arguments
                                .get("descending")
                                .and_then(Value::as_bool)
                                .unwrap_or(false),
                        }),
                    limit: arguments
                        .get("limit")
                        .and_then(Value::as_u64)
                        .map(|n| n as usize),
                };

                let mut rows = self.facts.find(&query).await?;
                for row in &mut rows {
                    if let Some(object) = row.as_object_mut() {
                        object.remove("doc_id");
                        object.remove("createdAt");
                    }
                }

                if rows.is_empty() {
                    NO_RESULTS_MSG.to_string()
                } else {
                    serde_json::to_string(&rows).map_err(AnalystError::from)?
                }
            }
            // Malformed query JSON goes back to the model as feedback
            Err(e) => e.to_string(),
        };

        Ok(json!({"query": query_str, "results": results}).to_string())
    }
}
