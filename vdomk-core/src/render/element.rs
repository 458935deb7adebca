use std::rc::Rc;

use crate::component::ComponentLayer;
use crate::error::Result;
use crate::host::{apply_property, Document, HostNode, SVG_NS};
use crate::vdom::VElement;

use super::{diff, RNode};

/// Renders an element and, optionally, its nested children.
#[derive(Debug)]
pub struct RElement {
    vnode: Rc<VElement>,
    node: HostNode,
    children: Option<Box<RNode>>,
    /// Created in the SVG namespace; props skip the direct-field path.
    svg: bool,
}

impl RElement {
    pub(crate) fn mount(
        vnode: &Rc<VElement>,
        parent: HostNode,
        adjacent: Option<HostNode>,
        layer: &Rc<ComponentLayer>,
    ) -> Result<Self> {
        let doc = layer.document();
        let svg = &*vnode.tag == "svg"
            || (doc.namespace(parent).as_deref() == Some(SVG_NS)
                && doc.tag(parent).as_deref() != Some("foreignObject"));
        let node = doc.create_element(&vnode.tag, svg.then_some(SVG_NS));
        doc.insert_before(parent, node, adjacent)?;

        let children = match Self::fill(vnode, node, svg, layer) {
            Ok(children) => children,
            Err(err) => {
                doc.remove(node);
                return Err(err);
            }
        };

        Ok(Self {
            vnode: Rc::clone(vnode),
            node,
            children,
            svg,
        })
    }

    fn fill(
        vnode: &VElement,
        node: HostNode,
        svg: bool,
        layer: &Rc<ComponentLayer>,
    ) -> Result<Option<Box<RNode>>> {
        for (key, value) in &vnode.props {
            apply_property(layer.document(), node, key, None, Some(value), svg, &**layer)?;
        }
        Ok(match &vnode.children {
            Some(child) => Some(Box::new(RNode::mount(child, node, None, layer)?)),
            None => None,
        })
    }

    pub fn vnode(&self) -> &Rc<VElement> {
        &self.vnode
    }

    pub fn node(&self) -> HostNode {
        self.node
    }

    pub fn is_svg(&self) -> bool {
        self.svg
    }

    pub(crate) fn update(&mut self, next: &Rc<VElement>, layer: &Rc<ComponentLayer>) -> Result<bool> {
        if self.vnode.tag != next.tag {
            return Ok(false);
        }
        let doc = layer.document();
        let previous = std::mem::replace(&mut self.vnode, Rc::clone(next));

        for (key, old) in &previous.props {
            if !next.props.contains_key(key) {
                apply_property(doc, self.node, key, Some(old), None, self.svg, &**layer)?;
            }
        }
        for (key, value) in &next.props {
            let old = previous.props.get(key);
            apply_property(doc, self.node, key, old, Some(value), self.svg, &**layer)?;
        }

        match &next.children {
            Some(child) => {
                if let Some(children) = self.children.as_deref_mut() {
                    diff(children, child, layer)?;
                } else {
                    self.children = Some(Box::new(RNode::mount(child, self.node, None, layer)?));
                }
            }
            None => {
                if let Some(mut stale) = self.children.take() {
                    stale.unmount(doc, true);
                }
            }
        }
        Ok(true)
    }

    pub(crate) fn unmount(&mut self, doc: &Document, remove_self: bool) {
        if let Some(mut children) = self.children.take() {
            children.unmount(doc, true);
        }
        if let Some(callback) = self.vnode.ref_callback() {
            callback.call(None);
        }
        if remove_self {
            doc.remove(self.node);
        }
    }
}
