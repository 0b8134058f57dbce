//! In-memory DOM and editor used by the unit tests.
//!
//! `FakeDom` keeps a node tree, inline styles, live listeners, and live timers
//! so tests can assert that every handle acquired during a session is
//! released. Node 0 is the document element; a node is "in the document"
//! when its parent chain reaches it.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::config::Config;
use crate::controller::ImageResize;
use crate::dom::{Dom, DomEvent, Editor, EventData, EventKind, ListenTarget, ListenerId, Phase, TimerId};
use crate::error::{DomError, ResizeError};
use crate::geometry::{BoundingBox, ScrollOffset};
use crate::module::{FeatureModule, ModuleFactory, ModuleRegistry, SessionContext};

/// Handle into a [`FakeDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FakeNode(pub usize);

#[derive(Debug, Default)]
struct FakeElement {
    tag: String,
    parent: Option<FakeNode>,
    children: Vec<FakeNode>,
    styles: BTreeMap<String, String>,
    attributes: BTreeMap<String, String>,
    text: String,
    rect: BoundingBox,
    scroll: ScrollOffset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub target: ListenTarget<FakeNode>,
    pub kind: EventKind,
    pub phase: Phase,
}

#[derive(Debug)]
pub struct FakeDom {
    nodes: Vec<FakeElement>,
    document_styles: BTreeMap<String, String>,
    listeners: BTreeMap<ListenerId, Registration>,
    timers: BTreeSet<TimerId>,
    next_listener: u64,
    next_timer: u64,
    pub native_resize_disabled: bool,
    pub fail_listen: bool,
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    pub fn new() -> Self {
        Self {
            nodes: vec![FakeElement { tag: "html".to_owned(), ..FakeElement::default() }],
            document_styles: BTreeMap::new(),
            listeners: BTreeMap::new(),
            timers: BTreeSet::new(),
            next_listener: 0,
            next_timer: 0,
            native_resize_disabled: false,
            fail_listen: false,
        }
    }

    pub fn document_element(&self) -> FakeNode {
        FakeNode(0)
    }

    fn node(&self, node: FakeNode) -> &FakeElement {
        &self.nodes[node.0]
    }

    fn node_mut(&mut self, node: FakeNode) -> &mut FakeElement {
        &mut self.nodes[node.0]
    }

    /// Create an element attached under `parent`.
    pub fn add(&mut self, parent: FakeNode, tag: &str) -> FakeNode {
        let node = FakeNode(self.nodes.len());
        self.nodes.push(FakeElement { tag: tag.to_owned(), parent: Some(parent), ..FakeElement::default() });
        self.node_mut(parent).children.push(node);
        node
    }

    pub fn set_rect(&mut self, node: FakeNode, rect: BoundingBox) {
        self.node_mut(node).rect = rect;
    }

    pub fn set_scroll(&mut self, node: FakeNode, scroll: ScrollOffset) {
        self.node_mut(node).scroll = scroll;
    }

    pub fn set_class(&mut self, node: FakeNode, class: &str) {
        self.node_mut(node).attributes.insert("class".to_owned(), class.to_owned());
    }

    pub fn children(&self, node: FakeNode) -> Vec<FakeNode> {
        self.node(node).children.clone()
    }

    pub fn parent(&self, node: FakeNode) -> Option<FakeNode> {
        self.node(node).parent
    }

    pub fn tag(&self, node: FakeNode) -> &str {
        &self.node(node).tag
    }

    pub fn text(&self, node: FakeNode) -> &str {
        &self.node(node).text
    }

    pub fn attribute(&self, node: FakeNode, name: &str) -> Option<&str> {
        self.node(node).attributes.get(name).map(String::as_str)
    }

    pub fn styles(&self, node: FakeNode) -> &BTreeMap<String, String> {
        &self.node(node).styles
    }

    pub fn document_styles(&self) -> &BTreeMap<String, String> {
        &self.document_styles
    }

    pub fn is_connected(&self, node: FakeNode) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n.0 == 0 {
                return true;
            }
            current = self.node(n).parent;
        }
        false
    }

    fn is_descendant(&self, node: FakeNode, ancestor: FakeNode) -> bool {
        let mut current = self.node(node).parent;
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.node(n).parent;
        }
        false
    }

    fn matches(&self, node: FakeNode, selector: &str) -> bool {
        match selector.strip_prefix('.') {
            Some(class) => self
                .node(node)
                .attributes
                .get("class")
                .is_some_and(|c| c.split_whitespace().any(|c| c == class)),
            None => self.node(node).tag.eq_ignore_ascii_case(selector),
        }
    }

    /// Every live listener.
    pub fn listeners(&self) -> &BTreeMap<ListenerId, Registration> {
        &self.listeners
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// The live listener registered on `target` for `kind`.
    pub fn listener(&self, target: &ListenTarget<FakeNode>, kind: EventKind) -> Option<ListenerId> {
        self.listeners
            .iter()
            .find(|(_, reg)| reg.target == *target && reg.kind == kind)
            .map(|(id, _)| *id)
    }

    pub fn listener_on(&self, node: FakeNode, kind: EventKind) -> Option<ListenerId> {
        self.listener(&ListenTarget::Node(node), kind)
    }

    pub fn document_listener(&self, kind: EventKind) -> Option<ListenerId> {
        self.listener(&ListenTarget::Document, kind)
    }

    pub fn timers(&self) -> Vec<TimerId> {
        self.timers.iter().copied().collect()
    }
}

impl Dom for FakeDom {
    type Node = FakeNode;

    fn create_element(&mut self, tag: &str) -> Result<FakeNode, DomError> {
        let node = FakeNode(self.nodes.len());
        self.nodes.push(FakeElement { tag: tag.to_owned(), ..FakeElement::default() });
        Ok(node)
    }

    fn append_child(&mut self, parent: &FakeNode, child: &FakeNode) -> Result<(), DomError> {
        self.remove(child);
        self.node_mut(*child).parent = Some(*parent);
        self.node_mut(*parent).children.push(*child);
        Ok(())
    }

    fn remove(&mut self, node: &FakeNode) {
        if let Some(parent) = self.node_mut(*node).parent.take() {
            self.node_mut(parent).children.retain(|c| c != node);
        }
    }

    fn set_style(&mut self, node: &FakeNode, property: &str, value: &str) -> Result<(), DomError> {
        let styles = &mut self.node_mut(*node).styles;
        if value.is_empty() {
            styles.remove(property);
        } else {
            styles.insert(property.to_owned(), value.to_owned());
        }
        Ok(())
    }

    fn style(&self, node: &FakeNode, property: &str) -> Option<String> {
        self.node(*node).styles.get(property).cloned()
    }

    fn set_document_style(&mut self, property: &str, value: &str) -> Result<(), DomError> {
        if value.is_empty() {
            self.document_styles.remove(property);
        } else {
            self.document_styles.insert(property.to_owned(), value.to_owned());
        }
        Ok(())
    }

    fn document_style(&self, property: &str) -> Option<String> {
        self.document_styles.get(property).cloned()
    }

    fn set_text(&mut self, node: &FakeNode, text: &str) -> Result<(), DomError> {
        text.clone_into(&mut self.node_mut(*node).text);
        Ok(())
    }

    fn set_attribute(&mut self, node: &FakeNode, name: &str, value: &str) -> Result<(), DomError> {
        self.node_mut(*node).attributes.insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn bounding_rect(&self, node: &FakeNode) -> Option<BoundingBox> {
        self.is_connected(*node).then(|| self.node(*node).rect)
    }

    fn scroll_offset(&self, node: &FakeNode) -> ScrollOffset {
        self.node(*node).scroll
    }

    fn closest(&self, node: &FakeNode, selector: &str, scope: &FakeNode) -> Option<FakeNode> {
        let mut current = Some(*node);
        while let Some(n) = current {
            if n == *scope {
                return None;
            }
            if self.matches(n, selector) {
                return self.is_descendant(n, *scope).then_some(n);
            }
            current = self.node(n).parent;
        }
        None
    }

    fn listen(&mut self, target: ListenTarget<FakeNode>, kind: EventKind, phase: Phase) -> Result<ListenerId, DomError> {
        if self.fail_listen {
            return Err(DomError::Js("listen refused".to_owned()));
        }
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id, Registration { target, kind, phase });
        Ok(id)
    }

    fn unlisten(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn set_timeout(&mut self, _delay_ms: u32) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        self.timers.insert(id);
        id
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    fn disable_native_resize(&mut self) {
        self.native_resize_disabled = true;
    }
}

/// Editor double recording every call the controller makes.
#[derive(Debug)]
pub struct FakeEditor {
    root: FakeNode,
    container: FakeNode,
    pub selection_clears: usize,
    pub deleted: Vec<FakeNode>,
    pub mirror_syncs: usize,
    pub fail_delete: bool,
}

impl FakeEditor {
    pub fn new(root: FakeNode, container: FakeNode) -> Self {
        Self { root, container, selection_clears: 0, deleted: Vec::new(), mirror_syncs: 0, fail_delete: false }
    }
}

impl Editor<FakeNode> for FakeEditor {
    fn root(&self) -> &FakeNode {
        &self.root
    }

    fn container(&self) -> &FakeNode {
        &self.container
    }

    fn clear_selection(&mut self) -> Result<(), ResizeError> {
        self.selection_clears += 1;
        Ok(())
    }

    fn delete_embed(&mut self, node: &FakeNode) -> Result<(), ResizeError> {
        if self.fail_delete {
            return Err(ResizeError::Editor("no blot".to_owned()));
        }
        self.deleted.push(*node);
        Ok(())
    }

    fn sync_mirror(&mut self) -> Result<(), ResizeError> {
        self.mirror_syncs += 1;
        Ok(())
    }
}

/// A document with two images and a paragraph inside an editing surface.
///
/// ```text
/// html
/// └── container (div)        0,0 800×600
///     └── root (div)         0,0 800×600
///         └── p
///             ├── image_a    40,100 200×150
///             ├── image_b    300,100 100×50
///             └── span
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub container: FakeNode,
    pub root: FakeNode,
    pub paragraph: FakeNode,
    pub image_a: FakeNode,
    pub image_b: FakeNode,
    pub span: FakeNode,
}

impl Fixture {
    pub fn build() -> (FakeDom, Self) {
        let mut dom = FakeDom::new();
        let html = dom.document_element();
        let container = dom.add(html, "div");
        let root = dom.add(container, "div");
        let paragraph = dom.add(root, "p");
        let image_a = dom.add(paragraph, "img");
        let image_b = dom.add(paragraph, "img");
        let span = dom.add(paragraph, "span");
        dom.set_rect(container, BoundingBox::new(0.0, 0.0, 800.0, 600.0));
        dom.set_rect(root, BoundingBox::new(0.0, 0.0, 800.0, 600.0));
        dom.set_rect(image_a, BoundingBox::new(40.0, 100.0, 200.0, 150.0));
        dom.set_rect(image_b, BoundingBox::new(300.0, 100.0, 100.0, 50.0));
        (dom, Self { container, root, paragraph, image_a, image_b, span })
    }

    pub fn editor(&self) -> FakeEditor {
        FakeEditor::new(self.root, self.container)
    }
}

pub type FakeController = ImageResize<FakeDom, FakeEditor>;

/// Build a controller over the standard fixture.
pub fn controller_with(config: Config, registry: ModuleRegistry<FakeDom>) -> Result<(FakeController, Fixture), ResizeError> {
    let (dom, fixture) = Fixture::build();
    let controller = ImageResize::new(dom, fixture.editor(), config, registry)?;
    Ok((controller, fixture))
}

/// Build a controller with the default configuration.
pub fn controller() -> Result<(FakeController, Fixture), ResizeError> {
    controller_with(Config::default(), ModuleRegistry::new())
}

/// Deliver a surface click on `target`.
pub fn click(controller: &mut FakeController, root: FakeNode, target: FakeNode) {
    if let Some(id) = controller.dom().listener_on(root, EventKind::Click) {
        controller.dispatch(DomEvent::Listener { id, data: EventData::on(target) });
    }
}

/// Deliver a surface scroll.
pub fn scroll(controller: &mut FakeController, root: FakeNode) {
    if let Some(id) = controller.dom().listener_on(root, EventKind::Scroll) {
        controller.dispatch(DomEvent::Listener { id, data: EventData::default() });
    }
}

/// Deliver a document keyup.
pub fn key_up(controller: &mut FakeController, key_code: u32) {
    if let Some(id) = controller.dom().document_listener(EventKind::KeyUp) {
        controller.dispatch(DomEvent::Listener { id, data: EventData::key(key_code) });
    }
}

/// Deliver a surface input event.
pub fn input(controller: &mut FakeController, root: FakeNode) {
    if let Some(id) = controller.dom().listener_on(root, EventKind::Input) {
        controller.dispatch(DomEvent::Listener { id, data: EventData::default() });
    }
}

/// Fire every live timer.
pub fn flush_timers(controller: &mut FakeController) {
    for id in controller.dom().timers() {
        controller.dispatch(DomEvent::Timer(id));
    }
}

/// Shared log of lifecycle calls, e.g. `"create:a"`.
pub type CallLog = Rc<RefCell<Vec<String>>>;

/// Module that records its lifecycle calls under `tag`.
#[derive(Debug)]
pub struct Probe {
    tag: String,
    log: CallLog,
    pub fail_create: bool,
}

impl FeatureModule<FakeDom> for Probe {
    fn on_create(&mut self, _ctx: &mut SessionContext<'_, FakeDom>) -> Result<(), ResizeError> {
        self.log.borrow_mut().push(format!("create:{}", self.tag));
        if self.fail_create {
            return Err(ResizeError::Editor(format!("{} refused", self.tag)));
        }
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut SessionContext<'_, FakeDom>) -> Result<(), ResizeError> {
        self.log.borrow_mut().push(format!("update:{}", self.tag));
        Ok(())
    }

    fn on_destroy(&mut self, _ctx: &mut SessionContext<'_, FakeDom>) {
        self.log.borrow_mut().push(format!("destroy:{}", self.tag));
    }
}

/// Factory producing [`Probe`] modules that share `log`.
pub fn probe(tag: &str, log: &CallLog) -> ModuleFactory<FakeDom> {
    let tag = tag.to_owned();
    let log = Rc::clone(log);
    Box::new(move || Box::new(Probe { tag: tag.clone(), log: Rc::clone(&log), fail_create: false }))
}

/// Factory producing [`Probe`] modules whose `on_create` fails.
pub fn failing_probe(tag: &str, log: &CallLog) -> ModuleFactory<FakeDom> {
    let tag = tag.to_owned();
    let log = Rc::clone(log);
    Box::new(move || Box::new(Probe { tag: tag.clone(), log: Rc::clone(&log), fail_create: true }))
}

/// Entries of `log` starting with `prefix`.
pub fn calls(log: &CallLog, prefix: &str) -> Vec<String> {
    log.borrow().iter().filter(|c| c.starts_with(prefix)).cloned().collect()
}
