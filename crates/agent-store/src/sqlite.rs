//! SQLite-backed durable store.
//!
//! Uses `rusqlite` to persist conversation records, fact documents, and
//! agent profiles in one database. Fact documents are schemaless JSON
//! bodies; the batch id is mirrored into an indexed column so lookups by
//! batch stay cheap, while any further field-equality filtering happens
//! in Rust application logic.

use std::path::Path;

use agent_core::convo::{ConvoEntry, ConvoRecord, ConvoStore};
use agent_core::error::{AgentError, Result};
use agent_core::facts::{FactQuery, FactStore, sort_and_limit};
use agent_core::profile::{AgentProfile, ProfileStore};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS convos (
         convo_id   TEXT PRIMARY KEY,
         org        TEXT NOT NULL,
         created_at TEXT NOT NULL
     );
     CREATE TABLE IF NOT EXISTS convo_entries (
         id         INTEGER PRIMARY KEY AUTOINCREMENT,
         convo_id   TEXT NOT NULL,
         entry      TEXT NOT NULL,
         created_at TEXT NOT NULL
     );
     CREATE INDEX IF NOT EXISTS idx_convo_entries_convo ON convo_entries(convo_id);
     CREATE TABLE IF NOT EXISTS facts (
         id     INTEGER PRIMARY KEY AUTOINCREMENT,
         doc_id TEXT,
         body   TEXT NOT NULL
     );
     CREATE INDEX IF NOT EXISTS idx_facts_doc ON facts(doc_id);
     CREATE TABLE IF NOT EXISTS profiles (
         name         TEXT NOT NULL,
         org          TEXT NOT NULL,
         instance     TEXT NOT NULL,
         instructions TEXT NOT NULL,
         model        TEXT NOT NULL,
         tools        TEXT NOT NULL,
         PRIMARY KEY (name, org, instance)
     );";

fn db_err(e: rusqlite::Error) -> AgentError {
    AgentError::Store(e.to_string())
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err)?;
        conn.execute_batch(&format!("PRAGMA journal_mode=WAL;\n{SCHEMA}"))
            .map_err(db_err)?;

        info!("SqliteStore opened at {:?}", path.as_ref());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl ConvoStore for SqliteStore {
    async fn create(&self, convo_id: &str, org: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR IGNORE INTO convos (convo_id, org, created_at) VALUES (?1, ?2, ?3)",
            params![convo_id, org, Utc::now().to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    async fn append(&self, convo_id: &str, entry: &ConvoEntry) -> Result<()> {
        let conn = self.conn.lock().await;

        let known: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM convos WHERE convo_id = ?1",
                params![convo_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        if known.is_none() {
            return Err(AgentError::Store(format!("unknown convo: {convo_id}")));
        }

        conn.execute(
            "INSERT INTO convo_entries (convo_id, entry, created_at) VALUES (?1, ?2, ?3)",
            params![
                convo_id,
                serde_json::to_string(entry)?,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(db_err)?;
        debug!(convo_id, "appended convo entry");
        Ok(())
    }

    async fn load(&self, convo_id: &str) -> Result<Option<ConvoRecord>> {
        let conn = self.conn.lock().await;

        let org: Option<String> = conn
            .query_row(
                "SELECT org FROM convos WHERE convo_id = ?1",
                params![convo_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        let Some(org) = org else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare("SELECT entry FROM convo_entries WHERE convo_id = ?1 ORDER BY id")
            .map_err(db_err)?;
        let raw: Vec<String> = stmt
            .query_map(params![convo_id], |row| row.get(0))
            .map_err(db_err)?
            .collect::<rusqlite::Result<_>>()
            .map_err(db_err)?;

        let mut record = ConvoRecord::new(convo_id, org);
        for json in raw {
            record.convo.push(serde_json::from_str(&json)?);
        }
        Ok(Some(record))
    }
}

#[async_trait]
impl FactStore for SqliteStore {
    async fn insert_rows(&self, rows: Vec<Value>) -> Result<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(db_err)?;

        let written = rows.len();
        for row in &rows {
            let doc_id = row["doc_id"].as_str();
            tx.execute(
                "INSERT INTO facts (doc_id, body) VALUES (?1, ?2)",
                params![doc_id, serde_json::to_string(row)?],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)?;
        debug!(rows = written, "inserted fact documents");
        Ok(written)
    }

    async fn find(&self, query: &FactQuery) -> Result<Vec<Value>> {
        let conn = self.conn.lock().await;

        // Batch-id filters hit the indexed column; everything else is
        // matched against the decoded bodies.
        let batch_id = query.filter.get("doc_id").and_then(Value::as_str);
        let raw: Vec<String> = if let Some(doc_id) = batch_id {
            let mut stmt = conn
                .prepare("SELECT body FROM facts WHERE doc_id = ?1 ORDER BY id")
                .map_err(db_err)?;
            stmt.query_map(params![doc_id], |row| row.get(0))
                .map_err(db_err)?
                .collect::<rusqlite::Result<_>>()
                .map_err(db_err)?
        } else {
            let mut stmt = conn
                .prepare("SELECT body FROM facts ORDER BY id")
                .map_err(db_err)?;
            stmt.query_map([], |row| row.get(0))
                .map_err(db_err)?
                .collect::<rusqlite::Result<_>>()
                .map_err(db_err)?
        };

        let mut matched = Vec::new();
        for json in raw {
            let doc: Value = serde_json::from_str(&json)?;
            if query.matches(&doc) {
                matched.push(doc);
            }
        }
        Ok(sort_and_limit(matched, query))
    }
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn get(&self, name: &str, org: &str, instance: &str) -> Result<Option<AgentProfile>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                "SELECT name, org, instance, instructions, model, tools
                 FROM profiles WHERE name = ?1 AND org = ?2 AND instance = ?3",
                params![name, org, instance],
                row_to_profile,
            )
            .optional()
            .map_err(db_err)?;

        row.map(profile_from_row).transpose()
    }

    async fn list(&self, name: &str, org: &str) -> Result<Vec<AgentProfile>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT name, org, instance, instructions, model, tools
                 FROM profiles WHERE name = ?1 AND org = ?2 ORDER BY instance",
            )
            .map_err(db_err)?;
        let rows: Vec<ProfileRow> = stmt
            .query_map(params![name, org], row_to_profile)
            .map_err(db_err)?
            .collect::<rusqlite::Result<_>>()
            .map_err(db_err)?;

        rows.into_iter().map(profile_from_row).collect()
    }

    async fn upsert(&self, profile: &AgentProfile) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO profiles (name, org, instance, instructions, model, tools)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                profile.name,
                profile.org,
                profile.instance,
                profile.instructions,
                profile.model,
                serde_json::to_string(&profile.tools)?,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row deserialization helpers
// ---------------------------------------------------------------------------

struct ProfileRow {
    name: String,
    org: String,
    instance: String,
    instructions: String,
    model: String,
    tools: String,
}

fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        name: row.get(0)?,
        org: row.get(1)?,
        instance: row.get(2)?,
        instructions: row.get(3)?,
        model: row.get(4)?,
        tools: row.get(5)?,
    })
}

fn profile_from_row(row: ProfileRow) -> Result<AgentProfile> {
    Ok(AgentProfile {
        name: row.name,
        org: row.org,
        instance: row.instance,
        instructions: row.instructions,
        model: row.model,
        tools: serde_json::from_str(&row.tools)?,
    })
}
