//! Component mounting and the shared theming wrapper

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use thiserror::Error;

use super::dom::HostDocument;
use super::style::THEME_CLASS;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("component {component} failed to render: {message}")]
    Component {
        component: &'static str,
        message: String,
    },
}

impl RenderError {
    pub fn component(component: &'static str, message: impl Into<String>) -> Self {
        Self::Component {
            component,
            message: message.into(),
        }
    }
}

/// Colour scheme applied by [`ThemeProvider`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

/// No-argument callback handed to components so they can dismiss themselves
#[derive(Clone)]
pub struct CloseCallback(Rc<dyn Fn()>);

impl CloseCallback {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn noop() -> Self {
        Self::new(|| {})
    }

    pub fn call(&self) {
        // The callback may release its own owner while running
        let f = Rc::clone(&self.0);
        f()
    }
}

impl fmt::Debug for CloseCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CloseCallback")
    }
}

/// Props as seen by a presented component: the caller's props plus the
/// injected `on_close`
#[derive(Debug, Clone)]
pub struct OverlayProps<P> {
    pub props: P,
    pub on_close: CloseCallback,
}

/// Where a component draws itself
pub struct RenderContext<'a, D: HostDocument> {
    pub document: &'a D,
    /// Node the component renders into (inside the theme wrapper)
    pub root: &'a D::Node,
    pub theme: Theme,
}

impl<D: HostDocument> RenderContext<'_, D> {
    /// Create an element and append it to the render root
    pub fn append_element(&self, tag: &str) -> D::Node {
        let node = self.document.create_element(tag);
        self.document.append_child(self.root, &node);
        node
    }
}

/// A UI component that can be presented as an overlay
pub trait Component<D: HostDocument> {
    type Props;

    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    fn render(
        &mut self,
        cx: &RenderContext<'_, D>,
        props: OverlayProps<Self::Props>,
    ) -> Result<(), RenderError>;

    /// Release whatever `render` acquired. Called once, before the nodes are cleared.
    fn unmount(&mut self) {}
}

/// The theming wrapper every presented component sits in
pub struct ThemeProvider;

impl ThemeProvider {
    /// Create the wrapper under `parent` and return it
    pub fn wrap<D: HostDocument>(document: &D, parent: &D::Node, theme: Theme) -> D::Node {
        let wrapper = document.create_element("div");
        document.set_attribute(&wrapper, "class", THEME_CLASS);
        document.set_attribute(&wrapper, "data-theme", theme.as_str());
        document.append_child(parent, &wrapper);
        wrapper
    }
}

/// A mounted component tree inside a mount point
pub struct RenderRoot<D: HostDocument> {
    document: D,
    mount_point: D::Node,
    theme: Theme,
    teardown: Option<Box<dyn FnOnce()>>,
}

impl<D: HostDocument> RenderRoot<D> {
    pub fn new(document: D, mount_point: D::Node, theme: Theme) -> Self {
        Self {
            document,
            mount_point,
            theme,
            teardown: None,
        }
    }

    /// Render `component` inside the theme wrapper.
    ///
    /// The component is retained even when rendering fails, so a later
    /// [`unmount`](Self::unmount) still releases a partial render.
    pub fn render<C>(&mut self, mut component: C, props: OverlayProps<C::Props>) -> Result<(), RenderError>
    where
        C: Component<D> + 'static,
    {
        self.unmount();

        let wrapper = ThemeProvider::wrap(&self.document, &self.mount_point, self.theme);
        let cx = RenderContext {
            document: &self.document,
            root: &wrapper,
            theme: self.theme,
        };
        let result = component.render(&cx, props);
        self.teardown = Some(Box::new(move || component.unmount()));
        result
    }

    pub fn is_mounted(&self) -> bool {
        self.teardown.is_some()
    }

    /// Run the component's unmount hook and clear the mount point. Idempotent.
    pub fn unmount(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
        self.document.remove_children(&self.mount_point);
    }
}
