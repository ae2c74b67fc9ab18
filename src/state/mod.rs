//! Per-tool state for the UI
//!
//! [`ToolStateProvider`] is the in-process view of the persisted
//! [`ToolStateRecord`](crate::data::ToolStateRecord); tools read their slice and
//! apply partial updates through it.

mod merge;
mod provider;
pub mod registry;
mod writer;

pub use merge::shallow_merge;
pub use provider::{StateChange, StateError, Subscription, ToolStateProvider};
pub use registry::{ToolDefinition, ToolRegistry};
pub use writer::StateWriter;
