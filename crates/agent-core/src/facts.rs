//! Fact Documents
//!
//! Schemaless storage for fetched reference data. Tools insert rows of
//! third-party API output as independent JSON documents, tagged with a
//! shared batch id so a later lookup can retrieve exactly one fetch's
//! worth of rows.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::Result;

/// Field-equality filter over fact documents
pub type FactFilter = Map<String, Value>;

/// Sort directive for a fact query
#[derive(Clone, Debug)]
pub struct FactSort {
    /// Field to order by
    pub field: String,

    /// Highest values first when set
    pub descending: bool,
}

/// A filtered, optionally sorted and capped fact lookup
#[derive(Clone, Debug, Default)]
pub struct FactQuery {
    /// Every entry must match the document field exactly
    pub filter: FactFilter,

    /// Optional ordering of the result set
    pub sort: Option<FactSort>,

    /// Optional cap on the number of rows returned
    pub limit: Option<usize>,
}

impl FactQuery {
    /// Query matching every document tagged with `doc_id`
    pub fn for_batch(doc_id: impl Into<String>) -> Self {
        let mut filter = FactFilter::new();
        filter.insert("doc_id".into(), Value::String(doc_id.into()));
        Self {
            filter,
            sort: None,
            limit: None,
        }
    }

    /// Add a field-equality condition
    pub fn with_eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filter.insert(field.into(), value);
        self
    }

    /// Add an ordering
    pub fn with_sort(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.sort = Some(FactSort {
            field: field.into(),
            descending,
        });
        self
    }

    /// Cap the result set
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `doc` satisfies every filter condition
    pub fn matches(&self, doc: &Value) -> bool {
        self.filter
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

/// Ordering between two JSON field values
///
/// Numbers compare numerically, strings lexically. Mixed or missing
/// values sort as equal so they keep their insertion order.
pub fn order_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Apply a query's sort and limit to an already-filtered row set
pub fn sort_and_limit(mut rows: Vec<Value>, query: &FactQuery) -> Vec<Value> {
    if let Some(sort) = &query.sort {
        rows.sort_by(|a, b| {
            let ord = order_values(a.get(&sort.field), b.get(&sort.field));
            if sort.descending { ord.reverse() } else { ord }
        });
    }
    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    rows
}

/// Storage seam for fact documents
#[async_trait]
pub trait FactStore: Send + Sync {
    /// Insert each row as an independent document
    ///
    /// Returns the number of documents written. All-or-nothing is not
    /// guaranteed across rows; callers treat any error as a failed batch.
    async fn insert_rows(&self, rows: Vec<Value>) -> Result<usize>;

    /// Equality-filtered lookup with optional sort and limit
    async fn find(&self, query: &FactQuery) -> Result<Vec<Value>>;
}

/// In-memory fact store for tests and single-process runs
#[derive(Default)]
pub struct MemoryFactStore {
    docs: Mutex<Vec<Value>>,
}

impl MemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of stored documents
    pub async fn count(&self) -> usize {
        self.docs.lock().await.len()
    }
}

#[async_trait]
impl FactStore for MemoryFactStore {
    async fn insert_rows(&self, rows: Vec<Value>) -> Result<usize> {
        let mut docs = self.docs.lock().await;
        let written = rows.len();
        docs.extend(rows);
        Ok(written)
    }

    async fn find(&self, query: &FactQuery) -> Result<Vec<Value>> {
        let docs = self.docs.lock().await;
        let matched: Vec<Value> = docs
            .iter()
            .filter(|doc| query.matches(doc))
            .cloned()
            .collect();
        Ok(sort_and_limit(matched, query))
    }
}
