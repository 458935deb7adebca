//! Host Document
//!
//! An in-process host tree that the reconciler mutates. It stands in for the
//! browser DOM: elements and text nodes, attributes, direct fields, event
//! listeners and namespaces.
//!
//! # Design
//!
//! Nodes live in a single map indexed by [`HostNode`] for O(1) lookups.
//! Parent and child links are stored on both ends so the tree can be walked
//! in either direction. [`Document`] is a cheap-clone handle; every method
//! borrows the shared state only for the duration of the call, so callbacks
//! (refs, listeners) are always invoked with no borrow held.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::vdom::{EventHandler, PropValue};

use super::node::{Event, HostNode, HostNodeKind, Listener, NodeData};

/// Namespace URI of vector-graphics elements.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Property names that elements expose as direct fields. Anything else is
/// written as an attribute.
const NATIVE_FIELDS: &[&str] = &[
    "checked",
    "className",
    "disabled",
    "hidden",
    "id",
    "innerText",
    "selected",
    "tabIndex",
    "textContent",
    "title",
    "value",
];

#[derive(Debug, Default)]
struct DocumentInner {
    nodes: HashMap<HostNode, NodeData>,
    mutations: u64,
}

impl DocumentInner {
    fn get(&self, node: HostNode) -> Result<&NodeData> {
        self.nodes.get(&node).ok_or(Error::UnknownNode(node))
    }

    fn get_mut(&mut self, node: HostNode) -> Result<&mut NodeData> {
        self.nodes.get_mut(&node).ok_or(Error::UnknownNode(node))
    }

    fn detach(&mut self, node: HostNode) {
        let parent = self.nodes.get_mut(&node).and_then(|data| data.parent.take());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.remove_child(node);
        }
    }

    /// Index in `parent`'s child list at which to insert before `before`.
    fn insertion_index(&self, parent: HostNode, before: Option<HostNode>) -> Result<usize> {
        let data = self.get(parent)?;
        match before {
            None => Ok(data.children.len()),
            Some(anchor) => data
                .children
                .iter()
                .position(|c| *c == anchor)
                .ok_or(Error::Detached(anchor)),
        }
    }

    fn dispose(&mut self, node: HostNode) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.nodes.remove(&id) {
                stack.extend(data.children);
            }
        }
    }
}

/// A mutable host tree.
///
/// # Example
///
/// ```rust
/// use vdomk_core::host::Document;
///
/// let doc = Document::new();
/// let body = doc.create_element("body", None);
/// let text = doc.create_text("hello");
/// doc.insert_before(body, text, None).unwrap();
/// assert_eq!(doc.text_content(body), "hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element. `namespace` is the namespace URI, if any.
    pub fn create_element(&self, tag: &str, namespace: Option<&str>) -> HostNode {
        let node = HostNode::new();
        let data = NodeData::element(tag.into(), namespace.map(Into::into));
        self.inner.borrow_mut().nodes.insert(node, data);
        node
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: &str) -> HostNode {
        let node = HostNode::new();
        self.inner
            .borrow_mut()
            .nodes
            .insert(node, NodeData::text(text.to_string()));
        node
    }

    /// Insert `node` into `parent` before `before` (or at the end), moving it
    /// out of its current parent first.
    pub fn insert_before(
        &self,
        parent: HostNode,
        node: HostNode,
        before: Option<HostNode>,
    ) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.get(node)?;
        inner.detach(node);
        let index = inner.insertion_index(parent, before)?;
        inner.get_mut(parent)?.children.insert(index, node);
        inner.get_mut(node)?.parent = Some(parent);
        inner.mutations += 1;
        Ok(())
    }

    /// Detach `node` from its parent and discard it together with its subtree.
    /// Removing an unknown node does nothing.
    pub fn remove(&self, node: HostNode) {
        let mut inner = self.inner.borrow_mut();
        if !inner.nodes.contains_key(&node) {
            return;
        }
        inner.detach(node);
        inner.dispose(node);
        inner.mutations += 1;
    }

    /// Move the run of siblings from `first` through `last` (inclusive) into
    /// `parent` before `before`. The nodes keep their identity and content.
    pub fn move_range(
        &self,
        first: HostNode,
        last: HostNode,
        parent: HostNode,
        before: Option<HostNode>,
    ) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let source = inner.get(first)?.parent.ok_or(Error::Detached(first))?;
        let run: Vec<HostNode> = {
            let siblings = &inner.get(source)?.children;
            let start = siblings
                .iter()
                .position(|c| *c == first)
                .ok_or(Error::Detached(first))?;
            let end = siblings[start..]
                .iter()
                .position(|c| *c == last)
                .map(|offset| start + offset)
                .ok_or(Error::Detached(last))?;
            siblings[start..=end].to_vec()
        };
        for node in &run {
            inner.detach(*node);
        }
        let index = inner.insertion_index(parent, before)?;
        inner
            .get_mut(parent)?
            .children
            .splice(index..index, run.iter().copied());
        for node in &run {
            inner.get_mut(*node)?.parent = Some(parent);
        }
        inner.mutations += 1;
        Ok(())
    }

    /// Parent of `node`, if attached.
    pub fn parent(&self, node: HostNode) -> Option<HostNode> {
        self.inner.borrow().nodes.get(&node).and_then(|d| d.parent)
    }

    /// Children of `node` in order.
    pub fn children(&self, node: HostNode) -> Vec<HostNode> {
        self.inner
            .borrow()
            .nodes
            .get(&node)
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    /// Element children of `node` in order, skipping text nodes.
    pub fn element_children(&self, node: HostNode) -> Vec<HostNode> {
        let inner = self.inner.borrow();
        inner
            .nodes
            .get(&node)
            .map(|d| {
                d.children
                    .iter()
                    .copied()
                    .filter(|c| inner.nodes.get(c).is_some_and(NodeData::is_element))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The sibling right after `node`.
    pub fn next_sibling(&self, node: HostNode) -> Option<HostNode> {
        let inner = self.inner.borrow();
        let parent = inner.nodes.get(&node)?.parent?;
        let siblings = &inner.nodes.get(&parent)?.children;
        let index = siblings.iter().position(|c| *c == node)?;
        siblings.get(index + 1).copied()
    }

    /// Whether the node exists (has not been removed).
    pub fn contains(&self, node: HostNode) -> bool {
        self.inner.borrow().nodes.contains_key(&node)
    }

    pub fn kind(&self, node: HostNode) -> Option<HostNodeKind> {
        self.inner.borrow().nodes.get(&node).map(|d| d.kind.clone())
    }

    pub fn tag(&self, node: HostNode) -> Option<Rc<str>> {
        self.inner.borrow().nodes.get(&node)?.tag().cloned()
    }

    pub fn namespace(&self, node: HostNode) -> Option<Rc<str>> {
        self.inner.borrow().nodes.get(&node)?.namespace().cloned()
    }

    /// Content of a text node.
    pub fn text(&self, node: HostNode) -> Option<String> {
        let inner = self.inner.borrow();
        let data = inner.nodes.get(&node)?;
        (!data.is_element()).then(|| data.text.clone())
    }

    /// Replace the content of a text node.
    pub fn set_text(&self, node: HostNode, text: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let data = inner.get_mut(node)?;
        data.text.clear();
        data.text.push_str(text);
        inner.mutations += 1;
        Ok(())
    }

    pub fn attribute(&self, node: HostNode, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(&node)?
            .attributes
            .get(name)
            .cloned()
    }

    pub fn set_attribute(&self, node: HostNode, name: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner
            .get_mut(node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        inner.mutations += 1;
        Ok(())
    }

    pub fn remove_attribute(&self, node: HostNode, name: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.get_mut(node)?.attributes.shift_remove(name).is_some() {
            inner.mutations += 1;
        }
        Ok(())
    }

    /// Whether `name` is a direct field on this node rather than an attribute.
    pub fn has_field(&self, node: HostNode, name: &str) -> bool {
        let is_element = self
            .inner
            .borrow()
            .nodes
            .get(&node)
            .is_some_and(NodeData::is_element);
        is_element && NATIVE_FIELDS.contains(&name)
    }

    pub fn field(&self, node: HostNode, name: &str) -> Option<PropValue> {
        self.inner.borrow().nodes.get(&node)?.fields.get(name).cloned()
    }

    pub fn set_field(&self, node: HostNode, name: &str, value: PropValue) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.get_mut(node)?.fields.insert(name.to_string(), value);
        inner.mutations += 1;
        Ok(())
    }

    pub fn add_listener(
        &self,
        node: HostNode,
        event: &str,
        capture: bool,
        handler: EventHandler,
    ) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.get_mut(node)?.listeners.push(Listener {
            event: event.to_string(),
            capture,
            handler,
        });
        inner.mutations += 1;
        Ok(())
    }

    pub fn remove_listener(
        &self,
        node: HostNode,
        event: &str,
        capture: bool,
        handler: &EventHandler,
    ) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let listeners = &mut inner.get_mut(node)?.listeners;
        let position = listeners
            .iter()
            .position(|l| l.event == event && l.capture == capture && l.handler.ptr_eq(handler));
        if let Some(index) = position {
            listeners.remove(index);
            inner.mutations += 1;
        }
        Ok(())
    }

    /// Number of listeners registered on `node` for `event`.
    pub fn listener_count(&self, node: HostNode, event: &str) -> usize {
        self.inner
            .borrow()
            .nodes
            .get(&node)
            .map(|d| d.listeners.iter().filter(|l| l.event == event).count())
            .unwrap_or(0)
    }

    /// Deliver an event to the listeners on `node`. Capture listeners run
    /// first. Returns how many listeners were invoked.
    pub fn dispatch(&self, node: HostNode, event: &str) -> usize {
        let mut handlers: Vec<(bool, EventHandler)> = self
            .inner
            .borrow()
            .nodes
            .get(&node)
            .map(|d| {
                d.listeners
                    .iter()
                    .filter(|l| l.event == event)
                    .map(|l| (l.capture, l.handler.clone()))
                    .collect()
            })
            .unwrap_or_default();
        handlers.sort_by_key(|(capture, _)| !*capture);

        let event = Event {
            name: event.to_string(),
            target: node,
        };
        for (_, handler) in &handlers {
            handler.call(&event);
        }
        handlers.len()
    }

    /// Concatenated text of every text node under `node`.
    pub fn text_content(&self, node: HostNode) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(data) = inner.nodes.get(&id) else {
                continue;
            };
            if data.is_element() {
                stack.extend(data.children.iter().rev());
            } else {
                out.push_str(&data.text);
            }
        }
        out
    }

    /// Serialized markup of `node`'s children. Fields are not serialized.
    pub fn inner_html(&self, node: HostNode) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        if let Some(data) = inner.nodes.get(&node) {
            for child in &data.children {
                write_html(&inner, *child, &mut out);
            }
        }
        out
    }

    /// Number of live nodes under `node`, not counting `node` itself.
    pub fn descendant_count(&self, node: HostNode) -> usize {
        let inner = self.inner.borrow();
        let mut count = 0;
        let mut stack: Vec<HostNode> = inner
            .nodes
            .get(&node)
            .map(|d| d.children.clone())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            count += 1;
            if let Some(data) = inner.nodes.get(&id) {
                stack.extend(data.children.iter().copied());
            }
        }
        count
    }

    /// Total number of nodes alive in the document, attached or not.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    /// Monotonic count of mutations applied to the document.
    pub fn mutation_count(&self) -> u64 {
        self.inner.borrow().mutations
    }
}

fn write_html(inner: &DocumentInner, node: HostNode, out: &mut String) {
    let Some(data) = inner.nodes.get(&node) else {
        return;
    };
    let Some(tag) = data.tag() else {
        escape_into(&data.text, false, out);
        return;
    };
    out.push('<');
    out.push_str(tag);
    for (name, value) in &data.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    out.push('>');
    for child in &data.children {
        write_html(inner, *child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
