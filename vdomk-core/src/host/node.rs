//! Host Nodes
//!
//! This module defines the node handles and per-node data stored in a
//! [`Document`](super::Document).

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::vdom::{EventHandler, PropValue};

/// Handle to a node in a host document.
///
/// Handles are plain ids; they stay valid to hold after the node is removed,
/// but every lookup on a removed node comes back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNode(u64);

impl HostNode {
    /// Generate a new unique node handle.
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// What a host node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNodeKind {
    Element {
        tag: Rc<str>,
        namespace: Option<Rc<str>>,
    },
    Text,
}

/// An event delivered to listeners.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub target: HostNode,
}

#[derive(Debug, Clone)]
pub(crate) struct Listener {
    pub event: String,
    pub capture: bool,
    pub handler: EventHandler,
}

/// Storage for one node.
#[derive(Debug)]
pub(crate) struct NodeData {
    pub kind: HostNodeKind,
    pub text: String,
    pub parent: Option<HostNode>,
    pub children: Vec<HostNode>,
    pub attributes: IndexMap<String, String>,
    pub fields: IndexMap<String, PropValue>,
    pub listeners: Vec<Listener>,
}

impl NodeData {
    pub fn element(tag: Rc<str>, namespace: Option<Rc<str>>) -> Self {
        Self::new(HostNodeKind::Element { tag, namespace })
    }

    pub fn text(text: String) -> Self {
        let mut data = Self::new(HostNodeKind::Text);
        data.text = text;
        data
    }

    fn new(kind: HostNodeKind) -> Self {
        Self {
            kind,
            text: String::new(),
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            fields: IndexMap::new(),
            listeners: Vec::new(),
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, HostNodeKind::Element { .. })
    }

    pub fn tag(&self) -> Option<&Rc<str>> {
        match &self.kind {
            HostNodeKind::Element { tag, .. } => Some(tag),
            HostNodeKind::Text => None,
        }
    }

    pub fn namespace(&self) -> Option<&Rc<str>> {
        match &self.kind {
            HostNodeKind::Element { namespace, .. } => namespace.as_ref(),
            HostNodeKind::Text => None,
        }
    }

    /// Remove a child handle from this node's child list.
    pub fn remove_child(&mut self, child: HostNode) -> bool {
        match self.children.iter().position(|c| *c == child) {
            Some(index) => {
                self.children.remove(index);
                true
            }
            None => false,
        }
    }
}
