//! Fragments and keyed list reconciliation.
//!
//! # Algorithm
//!
//! Old children `O[0..m)` are reconciled against new children `N[0..n)`:
//!
//! 1. For each index in `[0, min(m, n))`, matching keys (including both
//!    unkeyed) are diffed in place. Otherwise the new child is requested and
//!    the old child released. A keyed request takes a released node with its
//!    key if one is already pooled, or reserves its position with a
//!    placeholder and waits; an unkeyed request mounts on the spot. A keyed
//!    release goes into the pool; an unkeyed release is unmounted.
//! 2. Old children past `n` are released.
//! 3. New children past `m` are requested at the end of the fragment,
//!    without waiting.
//! 4. Every waiting request is resolved against the pool, moving the pooled
//!    node to its placeholder (or mounting fresh), and the placeholder is
//!    dropped.
//! 5. Whatever is left in the pool is unmounted.
//!
//! Collecting first and resolving afterwards means a reorder moves nodes
//! instead of unmounting and remounting them.
//!
//! When a step fails, the nodes that are still mounted stay on as the
//! fragment's children, in document order, so a later update or unmount
//! reaches them.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::component::ComponentLayer;
use crate::config::DuplicateKeyPolicy;
use crate::error::{Error, Result};
use crate::host::{Document, HostNode};
use crate::vdom::{Key, VArray, VNode};

use super::{diff, RNode};

/// Renders a fragment. Its children sit between two empty marker text nodes.
#[derive(Debug)]
pub struct RArray {
    vnode: Rc<VArray>,
    start: HostNode,
    end: HostNode,
    children: Vec<RNode>,
}

impl RArray {
    pub(crate) fn mount(
        vnode: &Rc<VArray>,
        parent: HostNode,
        adjacent: Option<HostNode>,
        layer: &Rc<ComponentLayer>,
    ) -> Result<Self> {
        check_keys(&vnode.items, layer.config().duplicate_keys)?;
        let doc = layer.document();
        let start = doc.create_text("");
        doc.insert_before(parent, start, adjacent)?;
        let mut children = Vec::with_capacity(vnode.items.len());
        for item in &vnode.items {
            match RNode::mount(item, parent, adjacent, layer) {
                Ok(child) => children.push(child),
                Err(err) => {
                    for mut child in children {
                        child.unmount(doc, true);
                    }
                    doc.remove(start);
                    return Err(err);
                }
            }
        }
        let end = doc.create_text("");
        doc.insert_before(parent, end, adjacent)?;

        Ok(Self {
            vnode: Rc::clone(vnode),
            start,
            end,
            children,
        })
    }

    pub fn vnode(&self) -> &Rc<VArray> {
        &self.vnode
    }

    pub fn start(&self) -> HostNode {
        self.start
    }

    pub fn end(&self) -> HostNode {
        self.end
    }

    pub fn children(&self) -> &[RNode] {
        &self.children
    }

    pub(crate) fn update(&mut self, next: &Rc<VArray>, layer: &Rc<ComponentLayer>) -> Result<bool> {
        let policy = layer.config().duplicate_keys;
        check_keys(&next.items, policy)?;
        let doc = layer.document();
        let parent = doc.parent(self.start).ok_or(Error::Detached(self.start))?;

        let old_len = self.children.len();
        let new_len = next.items.len();
        let shared = old_len.min(new_len);
        let mut old = std::mem::take(&mut self.children).into_iter();
        let mut list = ListReconciler::new(layer, parent, new_len);

        if let Err(err) = list.reconcile(&mut old, &next.items, shared, self.end) {
            // keep every node that is still mounted so a later pass or
            // unmount can reach it
            let mut survivors = list.abandon();
            survivors.extend(old);
            let order = doc.children(parent);
            survivors.sort_by_key(|child| order.iter().position(|node| *node == child.first()));
            warn!(survivors = survivors.len(), %err, "fragment update failed");
            self.children = survivors;
            return Err(err);
        }
        self.children = list.finish();
        self.vnode = Rc::clone(next);
        trace!(old_len, new_len, "fragment reconciled");
        Ok(true)
    }

    pub(crate) fn unmount(&mut self, doc: &Document, remove_self: bool) {
        for mut child in self.children.drain(..) {
            child.unmount(doc, true);
        }
        doc.remove(self.end);
        if remove_self {
            doc.remove(self.start);
        }
    }
}

/// A new child waiting for the pool to fill before it mounts.
struct Request {
    placeholder: HostNode,
    index: usize,
    vnode: VNode,
}

/// State of one keyed reconciliation pass.
struct ListReconciler<'a> {
    layer: &'a Rc<ComponentLayer>,
    doc: &'a Document,
    parent: HostNode,
    slots: Vec<Option<RNode>>,
    released: IndexMap<Key, RNode>,
    requested: Vec<Request>,
}

impl<'a> ListReconciler<'a> {
    fn new(layer: &'a Rc<ComponentLayer>, parent: HostNode, len: usize) -> Self {
        Self {
            layer,
            doc: layer.document(),
            parent,
            slots: std::iter::repeat_with(|| None).take(len).collect(),
            released: IndexMap::new(),
            requested: Vec::new(),
        }
    }

    /// Fill slot `index` with a node for `vnode` placed before `anchor`.
    fn request(&mut self, anchor: HostNode, vnode: &VNode, index: usize, can_defer: bool) -> Result<()> {
        if let Some(key) = vnode.key() {
            if let Some(pooled) = self.released.shift_remove(key) {
                let slot = self.slots[index].insert(pooled);
                slot.move_to(self.doc, Some(anchor))?;
                return diff(slot, vnode, self.layer);
            }
            if can_defer {
                let placeholder = self.doc.create_text("");
                self.doc.insert_before(self.parent, placeholder, Some(anchor))?;
                self.requested.push(Request {
                    placeholder,
                    index,
                    vnode: vnode.clone(),
                });
                return Ok(());
            }
        }
        self.slots[index] = Some(RNode::mount(vnode, self.parent, Some(anchor), self.layer)?);
        Ok(())
    }

    /// Give up `node`: pool it under its key, or unmount it when unkeyed.
    fn release(&mut self, mut node: RNode, key: Option<Key>) {
        let Some(key) = key else {
            node.unmount(self.doc, true);
            return;
        };
        if let Some(mut displaced) = self.released.insert(key, node) {
            trace!("duplicate key displaced a pooled node");
            displaced.unmount(self.doc, true);
        }
    }

    /// Steps 1 to 4. Every node taken out of `old` ends up in a slot or
    /// in the pool, or is unmounted, even when this fails.
    fn reconcile(
        &mut self,
        old: &mut impl Iterator<Item = RNode>,
        items: &[VNode],
        shared: usize,
        end: HostNode,
    ) -> Result<()> {
        for (index, item) in items.iter().take(shared).enumerate() {
            let Some(child) = old.next() else { break };
            let old_key = child.key().cloned();
            if old_key.as_ref() == item.key() {
                let slot = self.slots[index].insert(child);
                diff(slot, item, self.layer)?;
            } else {
                let requested = self.request(child.first(), item, index, true);
                self.release(child, old_key);
                requested?;
            }
        }
        for child in old.by_ref() {
            let key = child.key().cloned();
            self.release(child, key);
        }
        for (index, item) in items.iter().enumerate().skip(shared) {
            self.request(end, item, index, false)?;
        }

        while !self.requested.is_empty() {
            let request = self.requested.remove(0);
            let resolved = self.request(request.placeholder, &request.vnode, request.index, false);
            self.doc.remove(request.placeholder);
            resolved?;
        }
        Ok(())
    }

    /// Step 5: unmount the unclaimed pool and return the children in order.
    fn finish(mut self) -> Vec<RNode> {
        for (_, mut leftover) in self.released.drain(..) {
            leftover.unmount(self.doc, true);
        }
        self.slots.into_iter().flatten().collect()
    }

    /// Drop unresolved placeholders and hand back every node this pass
    /// still owns, filled slots first, then the pool.
    fn abandon(self) -> Vec<RNode> {
        for request in &self.requested {
            self.doc.remove(request.placeholder);
        }
        let mut nodes: Vec<RNode> = self.slots.into_iter().flatten().collect();
        nodes.extend(self.released.into_values());
        nodes
    }
}

/// Enforce the duplicate key policy on a new list of siblings.
fn check_keys(items: &[VNode], policy: DuplicateKeyPolicy) -> Result<()> {
    if policy == DuplicateKeyPolicy::Allow {
        return Ok(());
    }
    let mut seen = HashSet::new();
    for key in items.iter().filter_map(VNode::key) {
        if seen.insert(key) {
            continue;
        }
        if policy == DuplicateKeyPolicy::Reject {
            return Err(Error::DuplicateKey(key.clone()));
        }
        warn!(%key, "duplicate key among siblings; the later sibling takes over the earlier one's node");
    }
    Ok(())
}
