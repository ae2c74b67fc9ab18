pub mod config;
pub mod data;
pub mod overlay;
pub mod state;
pub mod util;

pub use config::Config;
pub use data::{
    Database, MemoryToolStateStore, SqliteToolStateStore, StoreError, ToolStateRecord,
    ToolStateStore, ToolStates,
};
pub use overlay::{
    CloseCallback, Component, HostDocument, MemoryDocument, OverlayHandle, OverlayManager,
    OverlayProps, PresentError, RenderContext, RenderError, Theme,
};
pub use state::{StateChange, StateError, ToolRegistry, ToolStateProvider};
