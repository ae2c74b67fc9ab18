//! Tool state store: the durable singleton record behind the state provider

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::database::DatabaseError;
use super::models::{ToolStateRecord, ToolStates};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to encode tool states: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
    #[error("Lock poisoned")]
    LockPoisoned,
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Get/put access to the single persisted [`ToolStateRecord`].
///
/// Implementations hold at most one record. `save` supersedes whatever was
/// stored before and never keeps history.
pub trait ToolStateStore: Send + Sync {
    /// Return the stored record, or `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<ToolStateRecord>, StoreError>;

    /// Upsert the record and return it as stored (with `id` and the bumped
    /// `updated_at`)
    fn save(&self, record: &ToolStateRecord) -> Result<ToolStateRecord, StoreError>;

    /// Remove the record entirely
    fn clear(&self) -> Result<(), StoreError>;
}

/// `updated_at` for a write: now, but never earlier than what the caller had
pub(crate) fn bump_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

/// SQLite-backed store; the record is the sole row of `tool_state`
#[derive(Clone)]
pub struct SqliteToolStateStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteToolStateStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn parse_timestamp(value: String) -> Result<DateTime<Utc>, StoreError> {
        DateTime::parse_from_rfc3339(&value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|source| StoreError::Timestamp { value, source })
    }
}

impl ToolStateStore for SqliteToolStateStore {
    fn load(&self) -> Result<Option<ToolStateRecord>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let row = conn
            .query_row(
                "SELECT id, tool_states, last_selected_tool, updated_at
                 FROM tool_state ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, tool_states, last_selected_tool, updated_at)) = row else {
            return Ok(None);
        };

        let tool_states: ToolStates = serde_json::from_str(&tool_states)?;
        Ok(Some(ToolStateRecord {
            id: Some(id),
            tool_states,
            last_selected_tool,
            updated_at: Self::parse_timestamp(updated_at)?,
        }))
    }

    fn save(&self, record: &ToolStateRecord) -> Result<ToolStateRecord, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let updated_at = bump_updated_at(record.updated_at);
        let tool_states = serde_json::to_string(&record.tool_states)?;

        let tx = conn.unchecked_transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM tool_state ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE tool_state
                     SET tool_states = ?1, last_selected_tool = ?2, updated_at = ?3
                     WHERE id = ?4",
                    params![
                        tool_states,
                        record.last_selected_tool,
                        updated_at.to_rfc3339(),
                        id
                    ],
                )?;
                // Rows left behind by an interrupted writer would break the singleton
                tx.execute("DELETE FROM tool_state WHERE id != ?1", params![id])?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO tool_state (tool_states, last_selected_tool, updated_at)
                     VALUES (?1, ?2, ?3)",
                    params![
                        tool_states,
                        record.last_selected_tool,
                        updated_at.to_rfc3339()
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };
        tx.commit()?;

        tracing::debug!(
            id,
            tools = record.tool_states.len(),
            "Saved tool state record"
        );

        Ok(ToolStateRecord {
            id: Some(id),
            tool_states: record.tool_states.clone(),
            last_selected_tool: record.last_selected_tool.clone(),
            updated_at,
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        conn.execute("DELETE FROM tool_state", [])?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteToolStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteToolStateStore").finish_non_exhaustive()
    }
}
