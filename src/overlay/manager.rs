//! Overlay lifecycle manager.
//!
//! Presents a component as a floating surface on top of a host page. Each
//! presentation owns three nodes (container, mount point, style tag) and a
//! mounted component tree; [`OverlayHandle::close`] releases all of them once,
//! no matter how many times it is called or what the host page did to the
//! nodes in the meantime.
//!
//! An overlay lives until it is closed, not until its handle is dropped: the
//! pending attachment and the component's `on_close` both keep it alive.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use uuid::Uuid;

use super::dom::HostDocument;
use super::readiness::{when_body_ready, ReadinessWait, DEFAULT_POLL_INTERVAL};
use super::render::{CloseCallback, Component, OverlayProps, RenderError, RenderRoot, Theme};
use super::style::{
    container_inline_style, critical_css, CONTENT_CLASS, HANDLE_ATTRIBUTE, OVERLAY_ID,
};
use crate::config::Config;

/// Callback run once after an overlay has been torn down
pub type OnClose = Box<dyn FnOnce()>;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Creates overlays in one host document
#[derive(Clone)]
pub struct OverlayManager<D: HostDocument> {
    document: D,
    poll_interval: Duration,
    theme: Theme,
}

impl<D: HostDocument> OverlayManager<D> {
    pub fn new(document: D) -> Self {
        Self {
            document,
            poll_interval: DEFAULT_POLL_INTERVAL,
            theme: Theme::default(),
        }
    }

    pub fn from_config(document: D, config: &Config) -> Self {
        Self::new(document)
            .with_poll_interval(config.readiness_poll_interval)
            .with_theme(config.theme)
    }

    /// Interval between body checks for deferred overlays. Clamped to at least 1ms.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Present `component` as an overlay.
    ///
    /// The container is attached to the body right away, or as soon as the
    /// body exists if the page is still loading. The component receives an
    /// `on_close` that closes the returned handle.
    ///
    /// A failing render is returned as [`PresentError`], which still carries
    /// the handle so the caller can close it.
    ///
    /// # Panics
    ///
    /// If the document has no body yet, attachment is deferred with
    /// [`when_body_ready`], which spawns onto the current
    /// [`tokio::task::LocalSet`]. Presenting into such a document outside a
    /// `LocalSet` panics.
    pub fn present<C>(
        &self,
        component: C,
        props: C::Props,
        on_close: Option<OnClose>,
    ) -> Result<OverlayHandle<D>, PresentError<D>>
    where
        C: Component<D> + 'static,
    {
        let document = &self.document;
        let id = Uuid::new_v4();
        let component_name = component.name();

        let container = document.create_element("div");
        document.set_attribute(&container, "id", OVERLAY_ID);
        document.set_attribute(&container, HANDLE_ATTRIBUTE, &id.to_string());
        document.set_attribute(&container, "style", &container_inline_style());

        let mount_point = document.create_element("div");
        document.set_attribute(&mount_point, "class", CONTENT_CLASS);
        document.append_child(&container, &mount_point);

        let style_tag = document.create_element("style");
        document.set_attribute(&style_tag, HANDLE_ATTRIBUTE, &id.to_string());
        document.set_text_content(&style_tag, &critical_css());

        let inner = Rc::new(HandleInner {
            id,
            document: document.clone(),
            container,
            mount_point: mount_point.clone(),
            style_tag,
            closed: Cell::new(false),
            rendering: Cell::new(false),
            root: RefCell::new(None),
            pending: RefCell::new(None),
            on_close: RefCell::new(on_close),
        });

        // Holds the overlay until it attaches or close() cancels the wait
        let attaching = Rc::clone(&inner);
        let wait = when_body_ready(document, self.poll_interval, move || attaching.attach());
        if wait.is_pending() {
            tracing::debug!(overlay = %id, "Overlay attachment deferred until body exists");
            *inner.pending.borrow_mut() = Some(wait);
        }

        let handle = OverlayHandle { inner };
        let props = OverlayProps {
            props,
            on_close: handle.close_callback(),
        };

        let mut root = RenderRoot::new(document.clone(), mount_point, self.theme);
        handle.inner.rendering.set(true);
        let result = root.render(component, props);
        handle.inner.rendering.set(false);

        if handle.is_closed() {
            // The component closed itself while rendering
            handle.inner.teardown(Some(root));
        } else {
            *handle.inner.root.borrow_mut() = Some(root);
        }

        match result {
            Ok(()) => {
                tracing::info!(overlay = %id, component = component_name, "Overlay presented");
                Ok(handle)
            }
            Err(source) => {
                tracing::error!(
                    overlay = %id,
                    component = component_name,
                    error = %source,
                    "Overlay render failed"
                );
                Err(PresentError { handle, source })
            }
        }
    }
}

struct HandleInner<D: HostDocument> {
    id: Uuid,
    document: D,
    container: D::Node,
    mount_point: D::Node,
    style_tag: D::Node,
    closed: Cell<bool>,
    /// Set while `present` is inside the component's render
    rendering: Cell<bool>,
    root: RefCell<Option<RenderRoot<D>>>,
    pending: RefCell<Option<ReadinessWait>>,
    on_close: RefCell<Option<OnClose>>,
}

impl<D: HostDocument> HandleInner<D> {
    fn attach(&self) {
        if self.closed.get() {
            return;
        }
        let Some(body) = self.document.body() else {
            return;
        };
        let style_parent = self.document.head().unwrap_or_else(|| body.clone());
        self.document.append_child(&style_parent, &self.style_tag);
        self.document.append_child(&body, &self.container);
        self.pending.borrow_mut().take();
        tracing::debug!(overlay = %self.id, "Overlay attached to host body");
    }

    fn close(&self) {
        if self.closed.replace(true) {
            return;
        }

        if let Some(wait) = self.pending.borrow_mut().take() {
            wait.cancel();
        }

        if self.rendering.get() {
            // present() finishes the teardown once render returns
            return;
        }

        let root = self.root.borrow_mut().take();
        self.teardown(root);
    }

    /// Unmount, detach the nodes if still attached, then notify the owner.
    /// Dropping the root releases the component and the callback it holds.
    fn teardown(&self, root: Option<RenderRoot<D>>) {
        if let Some(mut root) = root {
            root.unmount();
        }

        if !self.document.detach(&self.container) {
            tracing::debug!(overlay = %self.id, "Overlay container already detached");
        }
        if !self.document.detach(&self.style_tag) {
            tracing::debug!(overlay = %self.id, "Overlay style tag already detached");
        }

        let on_close = self.on_close.borrow_mut().take();
        if let Some(on_close) = on_close {
            on_close();
        }

        tracing::info!(overlay = %self.id, "Overlay closed");
    }
}

/// Owner's handle on a presented overlay. Clones refer to the same overlay.
pub struct OverlayHandle<D: HostDocument> {
    inner: Rc<HandleInner<D>>,
}

impl<D: HostDocument> Clone for OverlayHandle<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: HostDocument> OverlayHandle<D> {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn container(&self) -> &D::Node {
        &self.inner.container
    }

    pub fn mount_point(&self) -> &D::Node {
        &self.inner.mount_point
    }

    pub fn style_tag(&self) -> &D::Node {
        &self.inner.style_tag
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Whether attachment is still waiting for the host body
    pub fn is_pending(&self) -> bool {
        self.inner
            .pending
            .borrow()
            .as_ref()
            .is_some_and(ReadinessWait::is_pending)
    }

    /// Whether the container currently sits directly in the host body
    pub fn is_attached(&self) -> bool {
        let document = &self.inner.document;
        match (document.body(), document.parent_node(&self.inner.container)) {
            (Some(body), Some(parent)) => body == parent,
            _ => false,
        }
    }

    /// Tear the overlay down: unmount the component, detach the container and
    /// style tag if they are still attached, then notify the owner. Only the
    /// first call has any effect.
    ///
    /// A close requested by the component while it is still rendering is
    /// completed as soon as the render returns, in the same order.
    pub fn close(&self) {
        self.inner.close();
    }

    /// A callback that closes this overlay. It keeps the overlay alive, so a
    /// component holding it can still close itself after every handle is gone.
    pub fn close_callback(&self) -> CloseCallback {
        let inner = Rc::clone(&self.inner);
        CloseCallback::new(move || inner.close())
    }
}

impl<D: HostDocument> fmt::Debug for OverlayHandle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayHandle")
            .field("id", &self.inner.id)
            .field("container", &self.inner.container)
            .field("closed", &self.inner.closed.get())
            .finish()
    }
}

/// A presentation whose render failed. Holds the handle so the partial
/// overlay can still be closed.
pub struct PresentError<D: HostDocument> {
    handle: OverlayHandle<D>,
    source: RenderError,
}

impl<D: HostDocument> PresentError<D> {
    pub fn handle(&self) -> &OverlayHandle<D> {
        &self.handle
    }

    pub fn render_error(&self) -> &RenderError {
        &self.source
    }

    pub fn into_parts(self) -> (OverlayHandle<D>, RenderError) {
        (self.handle, self.source)
    }
}

impl<D: HostDocument> fmt::Debug for PresentError<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentError")
            .field("handle", &self.handle)
            .field("source", &self.source)
            .finish()
    }
}

impl<D: HostDocument> fmt::Display for PresentError<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay {} failed to render: {}", self.handle.id(), self.source)
    }
}

impl<D: HostDocument> std::error::Error for PresentError<D> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
