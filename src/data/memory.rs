//! In-memory tool state store.
//!
//! Used by tests and as the session-only fallback when the database cannot be
//! opened. Failure injection lets callers exercise the degraded paths.

use parking_lot::Mutex;

use super::models::ToolStateRecord;
use super::tool_state::{bump_updated_at, StoreError, ToolStateStore};

#[derive(Debug, Default)]
struct Inner {
    record: Option<ToolStateRecord>,
    fail_loads: bool,
    fail_saves: bool,
    saves: usize,
}

#[derive(Debug, Default)]
pub struct MemoryToolStateStore {
    inner: Mutex<Inner>,
}

impl MemoryToolStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record, as if it had been saved earlier
    pub fn with_record(record: ToolStateRecord) -> Self {
        let store = Self::default();
        store.inner.lock().record = Some(ToolStateRecord {
            id: Some(1),
            ..record
        });
        store
    }

    /// Make every subsequent `load` fail
    pub fn fail_loads(&self, fail: bool) {
        self.inner.lock().fail_loads = fail;
    }

    /// Make every subsequent `save` fail
    pub fn fail_saves(&self, fail: bool) {
        self.inner.lock().fail_saves = fail;
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.inner.lock().saves
    }
}

impl ToolStateStore for MemoryToolStateStore {
    fn load(&self) -> Result<Option<ToolStateRecord>, StoreError> {
        let inner = self.inner.lock();
        if inner.fail_loads {
            return Err(StoreError::Unavailable("load disabled".to_string()));
        }
        Ok(inner.record.clone())
    }

    fn save(&self, record: &ToolStateRecord) -> Result<ToolStateRecord, StoreError> {
        let mut inner = self.inner.lock();
        if inner.fail_saves {
            return Err(StoreError::Unavailable("save disabled".to_string()));
        }

        let stored = ToolStateRecord {
            id: Some(inner.record.as_ref().and_then(|r| r.id).unwrap_or(1)),
            tool_states: record.tool_states.clone(),
            last_selected_tool: record.last_selected_tool.clone(),
            updated_at: bump_updated_at(record.updated_at),
        };
        inner.record = Some(stored.clone());
        inner.saves += 1;
        Ok(stored)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.inner.lock().record = None;
        Ok(())
    }
}
