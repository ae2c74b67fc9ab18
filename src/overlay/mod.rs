//! Overlay injection into host pages
//!
//! [`OverlayManager`] presents components on top of an uncontrolled page through
//! the [`HostDocument`] abstraction, deferring attachment with the readiness
//! guard while the page has no body yet.

mod dom;
mod manager;
mod memory_dom;
mod readiness;
mod render;
mod style;

pub use dom::HostDocument;
pub use manager::{OnClose, OverlayHandle, OverlayManager, PresentError};
pub use memory_dom::{MemoryDocument, NodeId};
pub use readiness::{when_body_ready, ReadinessWait, DEFAULT_POLL_INTERVAL};
pub use render::{
    CloseCallback, Component, OverlayProps, RenderContext, RenderError, RenderRoot, Theme,
    ThemeProvider,
};
pub use style::{
    container_inline_style, critical_css, CONTENT_CLASS, HANDLE_ATTRIBUTE, MAX_Z_INDEX,
    OVERLAY_ID, THEME_CLASS,
};
