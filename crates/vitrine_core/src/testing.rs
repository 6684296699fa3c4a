//! Test doubles for the host traits
//!
//! [`FakeDocument`] is an in-memory element tree. Elements are plain indices,
//! selectors support `.class`, `#id`, bare tag names and comma lists, and
//! every style write is counted so tests can assert that nothing was
//! rewritten.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::announcement::FlagStore;
use crate::document::{Clock, Document, ModalMount};
use crate::error::{Result, VitrineError};
use crate::page::Page;
use crate::tracking::TrackingSink;
use crate::viewport::{Bounds, Viewport};

#[derive(Debug, Default)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    styles: FxHashMap<String, String>,
    style_writes: usize,
    text: String,
    parent: Option<usize>,
    children: Vec<usize>,
    bounds: Bounds,
    attached: bool,
}

#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
    viewport: Viewport,
    scroll_locked: bool,
    focused: Option<usize>,
    mounted: Vec<ModalMount<usize>>,
    removals: usize,
}

/// In-memory [`Document`]; node 0 is the body
#[derive(Debug)]
pub struct FakeDocument {
    tree: RefCell<Tree>,
}

impl Default for FakeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDocument {
    /// A document with only a body, in a 1280x800 viewport
    pub fn new() -> Self {
        let body = Node {
            tag: "body".to_string(),
            attached: true,
            ..Node::default()
        };
        Self {
            tree: RefCell::new(Tree {
                nodes: vec![body],
                viewport: Viewport::new(1280.0, 800.0, 0.0),
                scroll_locked: false,
                focused: None,
                mounted: Vec::new(),
                removals: 0,
            }),
        }
    }

    /// The body element
    pub fn body(&self) -> usize {
        0
    }

    /// Append a `div`; an empty id means none
    pub fn add(&self, parent: usize, id: &str, classes: &[&str]) -> usize {
        self.add_tag(parent, "div", id, classes)
    }

    /// Append an element with a tag name
    pub fn add_tag(&self, parent: usize, tag: &str, id: &str, classes: &[&str]) -> usize {
        let mut tree = self.tree.borrow_mut();
        let index = tree.nodes.len();
        let attached = tree.nodes[parent].attached;
        tree.nodes.push(Node {
            tag: tag.to_string(),
            id: (!id.is_empty()).then(|| id.to_string()),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            parent: Some(parent),
            attached,
            ..Node::default()
        });
        tree.nodes[parent].children.push(index);
        index
    }

    /// Set an element's own text
    pub fn set_text(&self, element: usize, text: &str) {
        self.tree.borrow_mut().nodes[element].text = text.to_string();
    }

    /// Set an element's viewport-relative box
    pub fn set_bounds(&self, element: usize, bounds: Bounds) {
        self.tree.borrow_mut().nodes[element].bounds = bounds;
    }

    /// Replace the window metrics
    pub fn set_viewport(&self, viewport: Viewport) {
        self.tree.borrow_mut().viewport = viewport;
    }

    /// Change the window width
    pub fn resize_to(&self, width: f32) {
        self.tree.borrow_mut().viewport.width = width;
    }

    /// Change the scroll offset (boxes do not move)
    pub fn scroll_to(&self, scroll_y: f32) {
        let mut tree = self.tree.borrow_mut();
        tree.viewport = tree.viewport.scrolled_to(scroll_y);
    }

    /// Parent of an element
    pub fn parent(&self, element: usize) -> Option<usize> {
        self.tree.borrow().nodes[element].parent
    }

    /// Check a class
    pub fn has_class(&self, element: usize, class: &str) -> bool {
        self.tree.borrow().nodes[element]
            .classes
            .iter()
            .any(|c| c == class)
    }

    /// Check a class on the element with an id
    pub fn has_class_by_id(&self, id: &str, class: &str) -> bool {
        self.find_id(id).is_some_and(|e| self.has_class(e, class))
    }

    /// Current inline style value
    pub fn style(&self, element: usize, property: &str) -> Option<String> {
        self.tree.borrow().nodes[element].styles.get(property).cloned()
    }

    /// Inline style value of the element with an id
    pub fn style_by_id(&self, id: &str, property: &str) -> Option<String> {
        self.find_id(id).and_then(|e| self.style(e, property))
    }

    /// Number of style writes an element has received
    pub fn style_writes(&self, element: usize) -> usize {
        self.tree.borrow().nodes[element].style_writes
    }

    /// Body scroll lock
    pub fn is_scroll_locked(&self) -> bool {
        self.tree.borrow().scroll_locked
    }

    /// Element with focus
    pub fn focused(&self) -> Option<usize> {
        self.tree.borrow().focused
    }

    /// Modals mounted so far, in order
    pub fn mounted_modals(&self) -> Vec<ModalMount<usize>> {
        self.tree.borrow().mounted.clone()
    }

    /// Number of `remove` calls
    pub fn removals(&self) -> usize {
        self.tree.borrow().removals
    }

    /// Attachment of an element
    pub fn is_attached_node(&self, element: usize) -> bool {
        self.tree.borrow().nodes[element].attached
    }

    /// Detach an element behind the core's back
    pub fn detach(&self, element: usize) {
        let mut tree = self.tree.borrow_mut();
        if let Some(parent) = tree.nodes[element].parent.take() {
            tree.nodes[parent].children.retain(|c| *c != element);
        }
        let mut stack = vec![element];
        while let Some(node) = stack.pop() {
            tree.nodes[node].attached = false;
            stack.extend(tree.nodes[node].children.iter().copied());
        }
    }

    fn find_id(&self, id: &str) -> Option<usize> {
        let tree = self.tree.borrow();
        tree.nodes
            .iter()
            .position(|n| n.attached && n.id.as_deref() == Some(id))
    }

    fn matches_simple(node: &Node, selector: &str) -> bool {
        if let Some(class) = selector.strip_prefix('.') {
            node.classes.iter().any(|c| c == class)
        } else if let Some(id) = selector.strip_prefix('#') {
            node.id.as_deref() == Some(id)
        } else {
            node.tag == selector
        }
    }

    fn matches_node(node: &Node, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .any(|part| Self::matches_simple(node, part))
    }

    /// Descendants of `root` (exclusive) in document order
    fn descendants(tree: &Tree, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = tree.nodes[root].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(tree.nodes[node].children.iter().rev().copied());
        }
        out
    }

    fn text_of(tree: &Tree, element: usize) -> String {
        let mut text = tree.nodes[element].text.clone();
        for child in Self::descendants(tree, element) {
            text.push_str(&tree.nodes[child].text);
        }
        text
    }
}

impl Document for FakeDocument {
    type Element = usize;

    fn element_by_id(&self, id: &str) -> Option<usize> {
        self.find_id(id)
    }

    fn query_all(&self, selector: &str) -> Vec<usize> {
        let tree = self.tree.borrow();
        Self::descendants(&tree, 0)
            .into_iter()
            .filter(|n| Self::matches_node(&tree.nodes[*n], selector))
            .collect()
    }

    fn query_within(&self, root: &usize, selector: &str) -> Vec<usize> {
        let tree = self.tree.borrow();
        Self::descendants(&tree, *root)
            .into_iter()
            .filter(|n| Self::matches_node(&tree.nodes[*n], selector))
            .collect()
    }

    fn closest(&self, element: &usize, selector: &str) -> Option<usize> {
        let tree = self.tree.borrow();
        let mut current = Some(*element);
        while let Some(node) = current {
            if Self::matches_node(&tree.nodes[node], selector) {
                return Some(node);
            }
            current = tree.nodes[node].parent;
        }
        None
    }

    fn contains(&self, ancestor: &usize, node: &usize) -> bool {
        let tree = self.tree.borrow();
        let mut current = Some(*node);
        while let Some(n) = current {
            if n == *ancestor {
                return true;
            }
            current = tree.nodes[n].parent;
        }
        false
    }

    fn element_id(&self, element: &usize) -> Option<String> {
        self.tree.borrow().nodes[*element].id.clone()
    }

    fn text_content(&self, element: &usize) -> String {
        Self::text_of(&self.tree.borrow(), *element)
    }

    fn bounds(&self, element: &usize) -> Bounds {
        self.tree.borrow().nodes[*element].bounds
    }

    fn viewport(&self) -> Viewport {
        self.tree.borrow().viewport
    }

    fn set_class(&self, element: &usize, class: &str, enabled: bool) {
        let mut tree = self.tree.borrow_mut();
        let classes = &mut tree.nodes[*element].classes;
        let present = classes.iter().any(|c| c == class);
        if enabled && !present {
            classes.push(class.to_string());
        } else if !enabled && present {
            classes.retain(|c| c != class);
        }
    }

    fn set_style(&self, element: &usize, property: &str, value: &str) {
        let mut tree = self.tree.borrow_mut();
        let node = &mut tree.nodes[*element];
        node.style_writes += 1;
        if value.is_empty() {
            node.styles.remove(property);
        } else {
            node.styles.insert(property.to_string(), value.to_string());
        }
    }

    fn set_scroll_locked(&self, locked: bool) {
        self.tree.borrow_mut().scroll_locked = locked;
    }

    fn focus(&self, element: &usize) {
        self.tree.borrow_mut().focused = Some(*element);
    }

    fn active_element(&self) -> Option<usize> {
        self.focused()
    }

    fn mount_video_modal(&self, title: &str) -> Option<ModalMount<usize>> {
        let body = self.body();
        let root = self.add(body, "", &["video-modal"]);
        let overlay = self.add(root, "", &["video-modal__overlay"]);
        let content = self.add(overlay, "", &["video-modal__content"]);
        let close = self.add_tag(content, "button", "", &["video-modal__close"]);
        let heading = self.add_tag(content, "strong", "", &[]);
        self.set_text(heading, title);
        let play = self.add_tag(content, "button", "", &["mock-play-btn"]);
        let pause = self.add_tag(content, "button", "", &["mock-pause-btn"]);

        let mount = ModalMount {
            root,
            overlay,
            close_button: Some(close),
            focusables: vec![close, play, pause],
        };
        self.tree.borrow_mut().mounted.push(mount.clone());
        Some(mount)
    }

    fn is_attached(&self, element: &usize) -> bool {
        self.is_attached_node(*element)
    }

    fn remove(&self, element: &usize) {
        self.detach(*element);
        self.tree.borrow_mut().removals += 1;
    }
}

/// Clock the test moves by hand
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    /// Start at `now_ms`
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: Cell::new(now_ms),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Shared-handle clock so a test can keep moving time after the page owns it
#[derive(Clone, Debug, Default)]
pub struct SharedClock(Rc<ManualClock>);

impl SharedClock {
    /// Start at `now_ms`
    pub fn new(now_ms: u64) -> Self {
        Self(Rc::new(ManualClock::new(now_ms)))
    }

    /// Jump to an absolute time
    pub fn set(&self, now_ms: u64) {
        self.0.set(now_ms);
    }
}

impl Clock for SharedClock {
    fn now_ms(&self) -> u64 {
        self.0.now_ms()
    }
}

/// In-memory [`FlagStore`], optionally failing every call
///
/// Clones share their values, standing in for one origin's storage across
/// page loads.
#[derive(Clone, Debug, Default)]
pub struct MemoryFlagStore {
    values: Rc<RefCell<FxHashMap<String, String>>>,
    unavailable: bool,
}

impl MemoryFlagStore {
    /// Working, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Same values, every call failing
    pub fn failing(&self) -> Self {
        Self {
            values: Rc::clone(&self.values),
            unavailable: true,
        }
    }

    /// Store whose reads and writes all fail
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Seed a value (works even when unavailable)
    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    /// Stored value, bypassing availability
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.unavailable {
            return Err(VitrineError::StorageUnavailable("storage disabled".to_string()));
        }
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.unavailable {
            return Err(VitrineError::StorageUnavailable("quota exceeded".to_string()));
        }
        self.insert(key, value);
        Ok(())
    }
}

/// [`TrackingSink`] that keeps every record; clones share the log
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    records: Rc<RefCell<Vec<(String, String)>>>,
}

impl RecordingSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Records so far, in order
    pub fn records(&self) -> Vec<(String, String)> {
        self.records.borrow().clone()
    }

    /// Records of one action
    pub fn labels(&self, action: &str) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|(a, _)| a == action)
            .map(|(_, l)| l.clone())
            .collect()
    }
}

impl TrackingSink for RecordingSink {
    fn record(&self, action: &str, label: &str) {
        self.records
            .borrow_mut()
            .push((action.to_string(), label.to_string()));
    }
}

/// Move time forward by `ms`, firing every intermediate deadline at its own time
///
/// Tasks scheduled while dispatching are picked up in the same run if they
/// fall inside the window.
pub fn run_for<D: Document>(page: &mut Page<D>, clock: &SharedClock, ms: u64) {
    let end = clock.now_ms() + ms;
    while let Some(deadline) = page.next_deadline().filter(|d| *d <= end) {
        clock.set(deadline.max(clock.now_ms()));
        page.advance();
    }
    clock.set(end);
    page.advance();
}
