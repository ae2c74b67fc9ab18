//! Known tools and their default state

use serde_json::{json, Value};

use crate::data::ToolStates;

/// Tool id of the screenshot annotation panel
pub const SCREENSHOT: &str = "screenshot";
/// Tool id of the JSON beautifier panel
pub const JSON_BEAUTIFIER: &str = "json-beautifier";
/// Tool id of the URL encoder panel
pub const URL_ENCODER: &str = "url-encoder";

/// A tool the provider knows defaults for
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub id: String,
    pub label: String,
    pub default_state: Value,
}

impl ToolDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>, default_state: Value) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            default_state,
        }
    }
}

/// The set of known tools, in registration order.
///
/// The set is open: tools may register at startup, and state for ids that are
/// not registered is still stored and merged, just without defaults.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    default_tool: Option<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled developer tools
    pub fn builtin() -> Self {
        Self::new()
            .register(ToolDefinition::new(
                SCREENSHOT,
                "Screenshot",
                json!({
                    "format": "png",
                    "quality": 0.92,
                    "captureArea": "visible",
                    "lastCapture": null
                }),
            ))
            .register(ToolDefinition::new(
                JSON_BEAUTIFIER,
                "JSON Beautifier",
                json!({
                    "input": "",
                    "indent": 2,
                    "sortKeys": false
                }),
            ))
            .register(ToolDefinition::new(
                URL_ENCODER,
                "URL Encoder",
                json!({
                    "input": "",
                    "mode": "encode",
                    "encodeComponent": true
                }),
            ))
    }

    /// Add a tool, replacing an existing definition with the same id
    pub fn register(mut self, tool: ToolDefinition) -> Self {
        self.tools.retain(|t| t.id != tool.id);
        self.tools.push(tool);
        self
    }

    /// Tool selected when nothing has been persisted yet
    pub fn with_default_tool(mut self, tool_id: Option<String>) -> Self {
        self.default_tool = tool_id;
        self
    }

    pub fn default_tool(&self) -> Option<&str> {
        self.default_tool.as_deref()
    }

    pub fn get(&self, tool_id: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.id == tool_id)
    }

    pub fn contains(&self, tool_id: &str) -> bool {
        self.get(tool_id).is_some()
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn default_state(&self, tool_id: &str) -> Option<&Value> {
        self.get(tool_id).map(|t| &t.default_state)
    }

    /// Default state for every known tool
    pub fn defaults(&self) -> ToolStates {
        self.tools
            .iter()
            .map(|t| (t.id.clone(), t.default_state.clone()))
            .collect()
    }
}
