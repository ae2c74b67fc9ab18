//! Temporary stores and components used across integration tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use devtools_ext::overlay::{NodeId, OnClose};
use devtools_ext::{
    CloseCallback, Component, Database, HostDocument, MemoryDocument, OverlayProps, RenderContext,
    RenderError, SqliteToolStateStore,
};
use tempfile::TempDir;

/// A SQLite-backed store in a temporary directory
pub struct TestStore {
    pub store: Arc<SqliteToolStateStore>,
    pub db: Database,
    pub dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open(dir.path().join("devtools.db")).expect("Failed to open database");
        let store = Arc::new(SqliteToolStateStore::new(db.connection()));
        Self { store, db, dir }
    }

    /// A second store on the same file, as a fresh process would open it
    pub fn reopen(&self) -> Arc<SqliteToolStateStore> {
        let db = Database::open(self.dir.path().join("devtools.db"))
            .expect("Failed to reopen database");
        Arc::new(SqliteToolStateStore::new(db.connection()))
    }
}

/// What a [`Probe`] observed
#[derive(Default)]
pub struct ProbeLog {
    pub renders: Cell<u32>,
    pub unmounts: Cell<u32>,
    pub close: RefCell<Option<CloseCallback>>,
}

/// Renders a paragraph and records its lifecycle
pub struct Probe {
    pub log: Rc<ProbeLog>,
    pub fail: bool,
}

impl Probe {
    pub fn recording() -> (Self, Rc<ProbeLog>) {
        let log = Rc::new(ProbeLog::default());
        (
            Self {
                log: log.clone(),
                fail: false,
            },
            log,
        )
    }

    pub fn failing() -> (Self, Rc<ProbeLog>) {
        let (mut probe, log) = Self::recording();
        probe.fail = true;
        (probe, log)
    }
}

impl Component<MemoryDocument> for Probe {
    type Props = String;

    fn name(&self) -> &'static str {
        "probe"
    }

    fn render(
        &mut self,
        cx: &RenderContext<'_, MemoryDocument>,
        props: OverlayProps<String>,
    ) -> Result<(), RenderError> {
        self.log.renders.set(self.log.renders.get() + 1);
        *self.log.close.borrow_mut() = Some(props.on_close);

        let p = cx.append_element("p");
        cx.document.set_text_content(&p, &props.props);
        if self.fail {
            return Err(RenderError::component(self.name(), "probe asked to fail"));
        }
        Ok(())
    }

    fn unmount(&mut self) {
        self.log.unmounts.set(self.log.unmounts.get() + 1);
    }
}

/// An on-close callback and the number of times it ran
pub fn close_counter() -> (Rc<Cell<u32>>, OnClose) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    (count, Box::new(move || c.set(c.get() + 1)))
}

/// Text of every `<p>` connected to the document
pub fn paragraphs(doc: &MemoryDocument) -> Vec<String> {
    doc.elements_by_tag("p")
        .into_iter()
        .filter_map(|node: NodeId| doc.text_content(node))
        .collect()
}

/// Whether `node` currently sits directly under the body
pub fn in_body(doc: &MemoryDocument, node: NodeId) -> bool {
    doc.body().is_some() && doc.parent_node(&node) == doc.body()
}
