//! Host document abstraction.
//!
//! The host page is not ours: scripts on it may remove or replace any node at
//! any time, including the body and the nodes we injected. Callers must never
//! assume a node is still attached without asking again.

use std::fmt;

/// Minimal DOM surface the overlay manager needs from a host document.
///
/// Handles are cheap to clone and refer to the same underlying document.
pub trait HostDocument: Clone + 'static {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    /// The `<body>` element, if the page has created it yet
    fn body(&self) -> Option<Self::Node>;

    /// The `<head>` element, if present
    fn head(&self) -> Option<Self::Node>;

    /// Create a detached element
    fn create_element(&self, tag: &str) -> Self::Node;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn set_text_content(&self, node: &Self::Node, text: &str);

    /// Append `child` to `parent`, moving it out of any previous parent
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);

    /// Remove `child` from `parent`. Returns false if it was not a child of `parent`.
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> bool;

    fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Remove every child of `node`
    fn remove_children(&self, node: &Self::Node);

    /// Detach `node` from wherever it currently lives. Returns false if it had
    /// no parent.
    fn detach(&self, node: &Self::Node) -> bool {
        match self.parent_node(node) {
            Some(parent) => self.remove_child(&parent, node),
            None => false,
        }
    }
}
