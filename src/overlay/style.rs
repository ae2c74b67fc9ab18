//! Fixed DOM contract of the injected overlay.
//!
//! Host integrations and automated tests locate overlays through these names,
//! so they must stay stable across releases.

/// `id` of every injected overlay container
pub const OVERLAY_ID: &str = "devtools-extension-popup";

/// Class of the mount point nested inside the container
pub const CONTENT_CLASS: &str = "devtools-extension-popup-content";

/// Class of the theming wrapper the component is rendered into
pub const THEME_CLASS: &str = "devtools-extension-theme";

/// Attribute carrying the per-handle id on the container and style tag
pub const HANDLE_ATTRIBUTE: &str = "data-overlay-id";

/// Largest value CSS accepts for `z-index`
pub const MAX_Z_INDEX: i32 = i32::MAX;

/// Inline style of the container: no footprint in the host layout, above everything
pub fn container_inline_style() -> String {
    format!(
        "position: absolute; top: 0; left: 0; width: 0; height: 0; \
         overflow: visible; z-index: {MAX_Z_INDEX};"
    )
}

/// Critical CSS injected next to the container. Host stylesheets may out-rank
/// class rules, so every declaration is `!important` and keyed on the id.
pub fn critical_css() -> String {
    format!(
        "#{OVERLAY_ID} {{ position: absolute !important; top: 0 !important; \
         left: 0 !important; width: 0 !important; height: 0 !important; \
         overflow: visible !important; z-index: {MAX_Z_INDEX} !important; }}\n\
         #{OVERLAY_ID} .{CONTENT_CLASS} {{ position: fixed !important; \
         z-index: {MAX_Z_INDEX} !important; font-family: system-ui, -apple-system, \
         \"Segoe UI\", Roboto, sans-serif !important; font-size: 14px !important; \
         line-height: 1.4 !important; }}"
    )
}
