//! Render Tree and Reconciler
//!
//! An [`RNode`] is the live counterpart of a [`VNode`]: it remembers the
//! virtual node it currently renders and owns the host nodes that render it.
//! [`diff`] moves one render node to a new virtual node with as few host
//! mutations as it can.
//!
//! # Diffing
//!
//! 1. A virtual node identical to the one already rendered is skipped along
//!    with its whole subtree.
//! 2. A virtual node of the same kind and key is applied in place. The kind
//!    may still refuse (an element whose tag changed, a component whose
//!    function changed, a portal whose container changed).
//! 3. Anything else replaces the render node: the old one is unmounted, the
//!    new one is mounted where the old one was.
//!
//! Every render node occupies a contiguous run of host siblings, from
//! [`RNode::first`] to [`RNode::last`], so it can be moved or replaced as a
//! unit. Fragments and components keep empty marker text nodes at both
//! ends of their run.

use std::rc::Rc;

use tracing::trace;

use crate::component::ComponentLayer;
use crate::error::{Error, Result};
use crate::host::{Document, HostNode};
use crate::vdom::{Key, VKind, VNode};

mod array;
mod component;
mod element;
mod portal;
mod text;

pub use array::RArray;
pub use component::RComponent;
pub use element::RElement;
pub use portal::RPortal;
pub use text::RText;

/// A live render node.
#[derive(Debug)]
pub enum RNode {
    Text(RText),
    Element(RElement),
    Component(RComponent),
    Array(RArray),
    Portal(RPortal),
}

impl RNode {
    /// Render `vnode` into `parent` before `adjacent` (or at the end).
    pub(crate) fn mount(
        vnode: &VNode,
        parent: HostNode,
        adjacent: Option<HostNode>,
        layer: &Rc<ComponentLayer>,
    ) -> Result<Self> {
        trace!(kind = ?vnode.kind(), key = ?vnode.key(), "mount");
        Ok(match vnode {
            VNode::Element(element) => Self::Element(RElement::mount(element, parent, adjacent, layer)?),
            VNode::Component(component) => {
                Self::Component(RComponent::mount(component, parent, adjacent, layer)?)
            }
            VNode::Array(array) => Self::Array(RArray::mount(array, parent, adjacent, layer)?),
            VNode::Portal(portal) => Self::Portal(RPortal::mount(portal, parent, adjacent, layer)?),
            leaf @ (VNode::Nothing | VNode::Bool(_) | VNode::Number(_) | VNode::Text(_)) => {
                Self::Text(RText::mount(leaf, parent, adjacent, layer.document())?)
            }
        })
    }

    /// The virtual node currently rendered.
    pub fn vnode(&self) -> VNode {
        match self {
            Self::Text(text) => text.vnode().clone(),
            Self::Element(element) => VNode::Element(Rc::clone(element.vnode())),
            Self::Component(component) => VNode::Component(Rc::clone(component.vnode())),
            Self::Array(array) => VNode::Array(Rc::clone(array.vnode())),
            Self::Portal(portal) => VNode::Portal(Rc::clone(portal.vnode())),
        }
    }

    /// True when `vnode` is identical to the rendered virtual node.
    pub fn renders(&self, vnode: &VNode) -> bool {
        match (self, vnode) {
            (Self::Text(text), leaf) => text.vnode().is_same(leaf),
            (Self::Element(element), VNode::Element(v)) => Rc::ptr_eq(element.vnode(), v),
            (Self::Component(component), VNode::Component(v)) => Rc::ptr_eq(component.vnode(), v),
            (Self::Array(array), VNode::Array(v)) => Rc::ptr_eq(array.vnode(), v),
            (Self::Portal(portal), VNode::Portal(v)) => Rc::ptr_eq(portal.vnode(), v),
            _ => false,
        }
    }

    pub fn kind(&self) -> VKind {
        match self {
            Self::Text(_) => VKind::Text,
            Self::Element(_) => VKind::Element,
            Self::Component(_) => VKind::Component,
            Self::Array(_) => VKind::Array,
            Self::Portal(_) => VKind::Portal,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        match self {
            Self::Text(_) => None,
            Self::Element(element) => element.vnode().key.as_ref(),
            Self::Component(component) => component.vnode().key.as_ref(),
            Self::Array(array) => array.vnode().key.as_ref(),
            Self::Portal(portal) => portal.vnode().key.as_ref(),
        }
    }

    /// First host node of this node's run of siblings.
    pub fn first(&self) -> HostNode {
        match self {
            Self::Text(text) => text.node(),
            Self::Element(element) => element.node(),
            Self::Component(component) => component.start(),
            Self::Array(array) => array.start(),
            Self::Portal(portal) => portal.placeholder(),
        }
    }

    /// Last host node of this node's run of siblings.
    pub fn last(&self) -> HostNode {
        match self {
            Self::Component(component) => component.end(),
            Self::Array(array) => array.end(),
            _ => self.first(),
        }
    }

    /// Apply `vnode` in place. `false` means this node cannot render it and
    /// must be replaced; nothing was changed in that case.
    pub(crate) fn update(&mut self, vnode: &VNode, layer: &Rc<ComponentLayer>) -> Result<bool> {
        match (self, vnode) {
            (Self::Element(element), VNode::Element(next)) => element.update(next, layer),
            (Self::Component(component), VNode::Component(next)) => component.update(next),
            (Self::Array(array), VNode::Array(next)) => array.update(next, layer),
            (Self::Portal(portal), VNode::Portal(next)) => portal.update(next, layer),
            (Self::Text(text), leaf @ (VNode::Nothing | VNode::Bool(_) | VNode::Number(_) | VNode::Text(_))) => {
                text.update(leaf, layer.document())
            }
            _ => Ok(false),
        }
    }

    /// Unmount the subtree: component cleanups run, refs are released and
    /// host nodes are discarded. With `remove_self` unset the first host
    /// node stays in place so the caller can use it as an insertion anchor.
    pub(crate) fn unmount(&mut self, doc: &Document, remove_self: bool) {
        trace!(kind = ?self.kind(), remove_self, "unmount");
        match self {
            Self::Text(text) => text.unmount(doc, remove_self),
            Self::Element(element) => element.unmount(doc, remove_self),
            Self::Component(component) => component.unmount(doc, remove_self),
            Self::Array(array) => array.unmount(doc, remove_self),
            Self::Portal(portal) => portal.unmount(doc, remove_self),
        }
    }

    /// Move this node's host run before `before` within its current parent,
    /// without running any lifecycle.
    pub(crate) fn move_to(&self, doc: &Document, before: Option<HostNode>) -> Result<()> {
        let first = self.first();
        let parent = doc.parent(first).ok_or(Error::Detached(first))?;
        trace!(?first, ?before, "move");
        doc.move_range(first, self.last(), parent, before)
    }
}

/// Bring `node` up to date with `vnode`, replacing it when it cannot be
/// updated in place.
///
/// `layer` is the component layer the node renders under: new components
/// become its children and effects go through its scheduler.
pub fn diff(node: &mut RNode, vnode: &VNode, layer: &Rc<ComponentLayer>) -> Result<()> {
    if node.renders(vnode) {
        return Ok(());
    }
    if node.kind() == vnode.kind() && node.key() == vnode.key() && node.update(vnode, layer)? {
        return Ok(());
    }

    let doc = layer.document();
    let anchor = node.first();
    let parent = doc.parent(anchor).ok_or(Error::Detached(anchor))?;
    node.unmount(doc, false);
    let replacement = match RNode::mount(vnode, parent, Some(anchor), layer) {
        Ok(replacement) => replacement,
        Err(err) => {
            // an empty text node holds the slot until the next diff
            let blank = RText::mount(&VNode::Nothing, parent, Some(anchor), doc)?;
            doc.remove(anchor);
            *node = RNode::Text(blank);
            return Err(err);
        }
    };
    doc.remove(anchor);
    *node = replacement;
    Ok(())
}
