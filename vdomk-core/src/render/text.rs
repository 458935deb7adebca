use crate::error::{Error, Result};
use crate::host::{Document, HostNode};
use crate::vdom::VNode;

/// Renders a leaf: nothing, a boolean, a number or a string. Leaves that
/// render nothing still own an (empty) text node so the position keeps an
/// anchor in the host tree.
#[derive(Debug)]
pub struct RText {
    vnode: VNode,
    node: HostNode,
}

impl RText {
    pub(crate) fn mount(
        vnode: &VNode,
        parent: HostNode,
        adjacent: Option<HostNode>,
        doc: &Document,
    ) -> Result<Self> {
        let node = doc.create_text(&vnode.to_text());
        doc.insert_before(parent, node, adjacent)?;
        Ok(Self {
            vnode: vnode.clone(),
            node,
        })
    }

    pub fn vnode(&self) -> &VNode {
        &self.vnode
    }

    pub fn node(&self) -> HostNode {
        self.node
    }

    pub(crate) fn update(&mut self, vnode: &VNode, doc: &Document) -> Result<bool> {
        if self.vnode.is_nothing() == vnode.is_nothing() {
            doc.set_text(self.node, &vnode.to_text())?;
        } else {
            let parent = doc.parent(self.node).ok_or(Error::Detached(self.node))?;
            let fresh = doc.create_text(&vnode.to_text());
            doc.insert_before(parent, fresh, Some(self.node))?;
            doc.remove(self.node);
            self.node = fresh;
        }
        self.vnode = vnode.clone();
        Ok(true)
    }

    pub(crate) fn unmount(&mut self, doc: &Document, remove_self: bool) {
        if remove_self {
            doc.remove(self.node);
        }
    }
}
