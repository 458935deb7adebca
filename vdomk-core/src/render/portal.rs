use std::rc::Rc;

use crate::component::ComponentLayer;
use crate::error::Result;
use crate::host::{Document, HostNode};
use crate::vdom::VPortal;

use super::{diff, RNode};

/// Renders children into another container. Its own position is held by an
/// empty placeholder text node.
#[derive(Debug)]
pub struct RPortal {
    vnode: Rc<VPortal>,
    placeholder: HostNode,
    children: Box<RNode>,
}

impl RPortal {
    pub(crate) fn mount(
        vnode: &Rc<VPortal>,
        parent: HostNode,
        adjacent: Option<HostNode>,
        layer: &Rc<ComponentLayer>,
    ) -> Result<Self> {
        let doc = layer.document();
        let placeholder = doc.create_text("");
        doc.insert_before(parent, placeholder, adjacent)?;
        let children = match RNode::mount(&vnode.children, vnode.container, vnode.adjacent, layer) {
            Ok(children) => children,
            Err(err) => {
                doc.remove(placeholder);
                return Err(err);
            }
        };
        Ok(Self {
            vnode: Rc::clone(vnode),
            placeholder,
            children: Box::new(children),
        })
    }

    pub fn vnode(&self) -> &Rc<VPortal> {
        &self.vnode
    }

    pub fn placeholder(&self) -> HostNode {
        self.placeholder
    }

    pub(crate) fn update(&mut self, next: &Rc<VPortal>, layer: &Rc<ComponentLayer>) -> Result<bool> {
        if self.vnode.container != next.container {
            return Ok(false);
        }
        diff(&mut self.children, &next.children, layer)?;
        if self.vnode.adjacent != next.adjacent {
            self.children.move_to(layer.document(), next.adjacent)?;
        }
        self.vnode = Rc::clone(next);
        Ok(true)
    }

    pub(crate) fn unmount(&mut self, doc: &Document, remove_self: bool) {
        self.children.unmount(doc, true);
        if remove_self {
            doc.remove(self.placeholder);
        }
    }
}
