//! Data persistence layer
//!
//! This module provides SQLite-based storage for the tool state record.

mod database;
mod memory;
mod migrations;
mod models;
mod tool_state;

pub use database::{Database, DatabaseError};
pub use memory::MemoryToolStateStore;
pub use models::{ToolStateRecord, ToolStates};
pub use tool_state::{SqliteToolStateStore, StoreError, ToolStateStore};
