use std::rc::Rc;

use crate::component::{same_props, ComponentLayer};
use crate::error::Result;
use crate::host::{Document, HostNode};
use crate::vdom::VComponent;

/// Renders a component invocation. The component's output lives between
/// two empty marker text nodes and is owned by the component's layer.
#[derive(Debug)]
pub struct RComponent {
    vnode: Rc<VComponent>,
    start: HostNode,
    end: HostNode,
    layer: Rc<ComponentLayer>,
}

impl RComponent {
    pub(crate) fn mount(
        vnode: &Rc<VComponent>,
        parent: HostNode,
        adjacent: Option<HostNode>,
        parent_layer: &Rc<ComponentLayer>,
    ) -> Result<Self> {
        let doc = parent_layer.document();
        let start = doc.create_text("");
        doc.insert_before(parent, start, adjacent)?;
        let end = doc.create_text("");
        doc.insert_before(parent, end, adjacent)?;

        let layer = ComponentLayer::child_of(parent_layer, Rc::clone(&vnode.props));
        if let Err(err) = layer.mount(&vnode.component, parent, Some(end)) {
            layer.unmount();
            doc.remove(end);
            doc.remove(start);
            return Err(err);
        }
        Ok(Self {
            vnode: Rc::clone(vnode),
            start,
            end,
            layer,
        })
    }

    pub fn vnode(&self) -> &Rc<VComponent> {
        &self.vnode
    }

    pub fn layer(&self) -> &Rc<ComponentLayer> {
        &self.layer
    }

    pub fn start(&self) -> HostNode {
        self.start
    }

    pub fn end(&self) -> HostNode {
        self.end
    }

    /// New props re-render the component right away, inside the caller's
    /// pass, rather than through the scheduler.
    pub(crate) fn update(&mut self, next: &Rc<VComponent>) -> Result<bool> {
        if !self.vnode.component.ptr_eq(&next.component) {
            return Ok(false);
        }
        let props_changed = !same_props(&self.vnode.props, &next.props);
        self.vnode = Rc::clone(next);
        if props_changed {
            self.layer.set_props(Rc::clone(&next.props));
            self.layer.run_update(true)?;
        }
        Ok(true)
    }

    pub(crate) fn unmount(&mut self, doc: &Document, remove_self: bool) {
        self.layer.unmount();
        doc.remove(self.end);
        if remove_self {
            doc.remove(self.start);
        }
    }
}
