//! Observable, per-tool state cache mirrored to the durable store.
//!
//! The provider is built once at startup and handed to every consumer by
//! `Rc`. Reads and updates are synchronous; persistence happens behind them on
//! the [`StateWriter`]. When the store cannot be read the provider keeps
//! working from defaults for the rest of the session.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::merge::{kind_of, shallow_merge};
use super::registry::ToolRegistry;
use super::writer::StateWriter;
use crate::data::{ToolStateRecord, ToolStateStore, ToolStates};

#[derive(Error, Debug)]
pub enum StateError {
    #[error("partial state for tool {tool_id} must be a JSON object, got {kind}")]
    Usage { tool_id: String, kind: &'static str },
    #[error("state of tool {tool_id} does not match its schema: {source}")]
    Schema {
        tool_id: String,
        source: serde_json::Error,
    },
}

/// What changed in the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    ToolUpdated(String),
    ToolReset(String),
    SelectionChanged(Option<String>),
}

type Subscriber = Rc<dyn Fn(&StateChange)>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, Subscriber)>,
}

/// Keeps a subscription alive; dropping it unsubscribes
pub struct Subscription {
    id: u64,
    subscribers: Rc<RefCell<Subscribers>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.subscribers
            .borrow_mut()
            .entries
            .retain(|(id, _)| *id != self.id);
    }
}

pub struct ToolStateProvider {
    tool_states: RefCell<ToolStates>,
    last_selected_tool: RefCell<Option<String>>,
    registry: ToolRegistry,
    subscribers: Rc<RefCell<Subscribers>>,
    writer: Option<StateWriter>,
    load_failed: Cell<bool>,
}

impl ToolStateProvider {
    /// Load state from `store` and start mirroring changes back to it.
    ///
    /// Defaults for every registered tool are in place before this returns.
    /// If the store cannot be read, the provider runs from defaults and does
    /// not write, so an unreadable record is never overwritten.
    ///
    /// Must be called within a tokio runtime.
    pub fn load(store: Arc<dyn ToolStateStore>, registry: ToolRegistry) -> Self {
        match store.load() {
            Ok(record) => {
                if record.is_none() {
                    tracing::info!("No persisted tool state; starting from defaults");
                }
                let mut provider = Self::from_record(record, registry);
                provider.writer = Some(StateWriter::spawn(store));
                provider
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Tool state store unavailable; using in-memory defaults for this session"
                );
                let provider = Self::from_record(None, registry);
                provider.load_failed.set(true);
                provider
            }
        }
    }

    /// A provider that never persists
    pub fn in_memory(registry: ToolRegistry) -> Self {
        Self::from_record(None, registry)
    }

    fn from_record(record: Option<ToolStateRecord>, registry: ToolRegistry) -> Self {
        let mut tool_states = registry.defaults();
        let mut last_selected_tool = None;

        if let Some(record) = record {
            for (tool_id, stored) in record.tool_states {
                match stored {
                    // Keys added to a tool's defaults since the record was written show up too
                    Value::Object(stored)
                        if tool_states.get(&tool_id).is_some_and(Value::is_object) =>
                    {
                        if let Some(current) = tool_states.get_mut(&tool_id) {
                            shallow_merge(current, stored);
                        }
                    }
                    stored => {
                        tool_states.insert(tool_id, stored);
                    }
                }
            }
            last_selected_tool = record.last_selected_tool;
        }

        let last_selected_tool =
            last_selected_tool.or_else(|| registry.default_tool().map(String::from));

        Self {
            tool_states: RefCell::new(tool_states),
            last_selected_tool: RefCell::new(last_selected_tool),
            registry,
            subscribers: Rc::new(RefCell::new(Subscribers::default())),
            writer: None,
            load_failed: Cell::new(false),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Snapshot of every tool's state
    pub fn tool_state(&self) -> ToolStates {
        self.tool_states.borrow().clone()
    }

    /// State of one tool, if any has been established
    pub fn tool_state_for(&self, tool_id: &str) -> Option<Value> {
        self.tool_states.borrow().get(tool_id).cloned()
    }

    /// Decode a tool's state into its own schema.
    ///
    /// A stored value that no longer fits falls back to the registered
    /// default; only a default that does not fit either is an error.
    pub fn typed<T: DeserializeOwned>(&self, tool_id: &str) -> Result<T, StateError> {
        if let Some(value) = self.tool_state_for(tool_id) {
            match serde_json::from_value(value) {
                Ok(typed) => return Ok(typed),
                Err(e) => {
                    tracing::warn!(
                        tool_id,
                        error = %e,
                        "Stored tool state does not match schema; using default"
                    );
                }
            }
        }

        let default = self
            .registry
            .default_state(tool_id)
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        serde_json::from_value(default).map_err(|source| StateError::Schema {
            tool_id: tool_id.to_string(),
            source,
        })
    }

    /// Shallow-merge `partial` into the tool's state.
    ///
    /// The change is visible to readers as soon as this returns. `partial`
    /// must be a JSON object.
    pub fn update_tool_state(&self, tool_id: &str, partial: Value) -> Result<(), StateError> {
        let partial = match partial {
            Value::Object(partial) => partial,
            other => {
                return Err(StateError::Usage {
                    tool_id: tool_id.to_string(),
                    kind: kind_of(&other),
                })
            }
        };

        if !self.registry.contains(tool_id) {
            tracing::debug!(tool_id, "Updating state of unregistered tool");
        }

        {
            let mut tool_states = self.tool_states.borrow_mut();
            let entry = tool_states
                .entry(tool_id.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
            shallow_merge(entry, partial);
        }

        self.persist();
        self.notify(StateChange::ToolUpdated(tool_id.to_string()));
        Ok(())
    }

    /// Restore a tool's registered default, or forget it if it has none
    pub fn reset_tool(&self, tool_id: &str) {
        {
            let mut tool_states = self.tool_states.borrow_mut();
            match self.registry.default_state(tool_id) {
                Some(default) => {
                    tool_states.insert(tool_id.to_string(), default.clone());
                }
                None => {
                    tool_states.remove(tool_id);
                }
            }
        }

        self.persist();
        self.notify(StateChange::ToolReset(tool_id.to_string()));
    }

    pub fn last_selected_tool(&self) -> Option<String> {
        self.last_selected_tool.borrow().clone()
    }

    /// Point the selection at `tool_id`, or clear it
    pub fn select_tool(&self, tool_id: Option<&str>) {
        let tool_id = tool_id.map(String::from);
        if *self.last_selected_tool.borrow() == tool_id {
            return;
        }
        *self.last_selected_tool.borrow_mut() = tool_id.clone();

        self.persist();
        self.notify(StateChange::SelectionChanged(tool_id));
    }

    /// Call `subscriber` after every change until the returned guard is dropped
    pub fn subscribe(&self, subscriber: impl Fn(&StateChange) + 'static) -> Subscription {
        let mut subscribers = self.subscribers.borrow_mut();
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.entries.push((id, Rc::new(subscriber)));
        Subscription {
            id,
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    /// The full record as it would be persisted now
    pub fn snapshot(&self) -> ToolStateRecord {
        ToolStateRecord::new(self.tool_state(), self.last_selected_tool())
    }

    /// Wait until every queued write has reached the store
    pub async fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.flush().await;
        }
    }

    /// Whether changes are being written to the store
    pub fn is_persistent(&self) -> bool {
        self.writer.is_some()
    }

    /// True if the store could not be read, or a write to it has failed
    pub fn persistence_degraded(&self) -> bool {
        self.load_failed.get()
            || self
                .writer
                .as_ref()
                .is_some_and(|writer| writer.failed_writes() > 0)
    }

    fn persist(&self) {
        if let Some(writer) = &self.writer {
            writer.save(self.snapshot());
        }
    }

    fn notify(&self, change: StateChange) {
        // Subscribers may read or update the provider
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .borrow()
            .entries
            .iter()
            .map(|(_, s)| s.clone())
            .collect();
        for subscriber in subscribers {
            subscriber(&change);
        }
    }
}

impl std::fmt::Debug for ToolStateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolStateProvider")
            .field("tools", &self.tool_states.borrow().len())
            .field("last_selected_tool", &self.last_selected_tool.borrow())
            .field("persistent", &self.is_persistent())
            .finish()
    }
}
