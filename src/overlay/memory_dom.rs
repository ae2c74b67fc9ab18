//! In-process host document.
//!
//! An arena-backed DOM with just enough behaviour to stand in for a real page:
//! a body that may not exist yet, host-side removal of nodes, and HTML output
//! for inspection. Single-threaded, like the page it models.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::Rc;

use super::dom::HostDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
    head: Option<NodeId>,
    body: Option<NodeId>,
}

impl Tree {
    fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            head: None,
            body: None,
        };
        tree.root = tree.alloc("html");
        let head = tree.alloc("head");
        tree.append(tree.root, head);
        tree.head = Some(head);
        tree
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: None,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.node(child).parent {
            self.remove(old, child);
        }
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    fn remove(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.node_mut(parent).children;
        let Some(pos) = children.iter().position(|c| *c == child) else {
            return false;
        };
        children.remove(pos);
        self.node_mut(child).parent = None;
        true
    }

    fn is_connected(&self, mut id: NodeId) -> bool {
        loop {
            if id == self.root {
                return true;
            }
            match self.node(id).parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn collect(&self, id: NodeId, predicate: &dyn Fn(&NodeData) -> bool, out: &mut Vec<NodeId>) {
        let node = self.node(id);
        if predicate(node) {
            out.push(id);
        }
        for child in &node.children {
            self.collect(*child, predicate, out);
        }
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        let _ = write!(out, "<{}", node.tag);
        for (name, value) in &node.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        out.push('>');
        if let Some(text) = &node.text {
            out.push_str(&escape(text));
        }
        for child in &node.children {
            self.serialize(*child, out);
        }
        let _ = write!(out, "</{}>", node.tag);
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A page document held in memory
#[derive(Clone)]
pub struct MemoryDocument {
    tree: Rc<RefCell<Tree>>,
}

impl MemoryDocument {
    /// A fully parsed page with `<head>` and `<body>`
    pub fn new() -> Self {
        let doc = Self::loading();
        doc.ensure_body();
        doc
    }

    /// A page still being parsed: `<head>` exists, `<body>` does not
    pub fn loading() -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree::new())),
        }
    }

    /// Create the body if it is missing, as the parser eventually does
    pub fn ensure_body(&self) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        if let Some(body) = tree.body {
            return body;
        }
        let body = tree.alloc("body");
        let root = tree.root;
        tree.append(root, body);
        tree.body = Some(body);
        body
    }

    /// Swap in a fresh, empty body, dropping everything under the old one
    pub fn replace_body(&self) -> NodeId {
        self.remove_body();
        self.ensure_body()
    }

    /// Remove the body from the document, as a hostile host script might
    pub fn remove_body(&self) {
        let mut tree = self.tree.borrow_mut();
        if let Some(body) = tree.body.take() {
            let root = tree.root;
            tree.remove(root, body);
        }
    }

    /// Connected elements whose `id` attribute equals `id`
    pub fn elements_by_id(&self, id: &str) -> Vec<NodeId> {
        self.query(|node| node.attributes.get("id").map(String::as_str) == Some(id))
    }

    /// Connected elements carrying `class` among their classes
    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.query(|node| {
            node.attributes
                .get("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
        })
    }

    /// Connected elements with the given tag name
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.query(|node| node.tag == tag)
    }

    fn query(&self, predicate: impl Fn(&NodeData) -> bool) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let mut out = Vec::new();
        tree.collect(tree.root, &predicate, &mut out);
        out
    }

    /// Whether the node is reachable from the document root
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.borrow().is_connected(node)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree.borrow().node(node).attributes.get(name).cloned()
    }

    pub fn text_content(&self, node: NodeId) -> Option<String> {
        self.tree.borrow().node(node).text.clone()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.borrow().node(node).children.clone()
    }

    pub fn tag_name(&self, node: NodeId) -> String {
        self.tree.borrow().node(node).tag.clone()
    }

    /// Serialize the connected document as HTML
    pub fn to_html(&self) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        tree.serialize(tree.root, &mut out);
        out
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tree = self.tree.borrow();
        f.debug_struct("MemoryDocument")
            .field("nodes", &tree.nodes.len())
            .field("has_body", &tree.body.is_some())
            .finish()
    }
}

impl HostDocument for MemoryDocument {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        self.tree.borrow().body
    }

    fn head(&self) -> Option<NodeId> {
        self.tree.borrow().head
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.tree.borrow_mut().alloc(tag)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.tree
            .borrow_mut()
            .node_mut(*node)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn set_text_content(&self, node: &NodeId, text: &str) {
        let mut tree = self.tree.borrow_mut();
        let children = std::mem::take(&mut tree.node_mut(*node).children);
        for child in children {
            tree.node_mut(child).parent = None;
        }
        tree.node_mut(*node).text = Some(text.to_string());
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.tree.borrow_mut().append(*parent, *child);
    }

    fn remove_child(&self, parent: &NodeId, child: &NodeId) -> bool {
        self.tree.borrow_mut().remove(*parent, *child)
    }

    fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
        self.tree.borrow().node(*node).parent
    }

    fn remove_children(&self, node: &NodeId) {
        let mut tree = self.tree.borrow_mut();
        let children = std::mem::take(&mut tree.node_mut(*node).children);
        for child in children {
            tree.node_mut(child).parent = None;
        }
        tree.node_mut(*node).text = None;
    }
}
