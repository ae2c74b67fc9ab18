//! Data models for persisted tool state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-tool state, keyed by tool identifier. Values are opaque to the core.
pub type ToolStates = BTreeMap<String, Value>;

/// The single persisted record holding every tool's state and the selection pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolStateRecord {
    /// Row identity, assigned by the store on first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// State per tool
    #[serde(default)]
    pub tool_states: ToolStates,
    /// Tool that was selected last, if any
    #[serde(default)]
    pub last_selected_tool: Option<String>,
    /// Time of the last write
    pub updated_at: DateTime<Utc>,
}

impl ToolStateRecord {
    /// Create an unsaved record
    pub fn new(tool_states: ToolStates, last_selected_tool: Option<String>) -> Self {
        Self {
            id: None,
            tool_states,
            last_selected_tool,
            updated_at: Utc::now(),
        }
    }

    /// An unsaved record with no tool state at all
    pub fn empty() -> Self {
        Self::new(ToolStates::new(), None)
    }
}
