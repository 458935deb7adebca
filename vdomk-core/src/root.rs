//! Render Roots
//!
//! A root attaches a render tree to a host container. It is modeled as a
//! component layer at depth 0 whose component simply returns whatever was
//! last passed to [`Root::render`].
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use vdomk_core::host::Document;
//! use vdomk_core::root::create_root;
//! use vdomk_core::scheduler::{LocalEventLoop, Scheduler};
//! use vdomk_core::vdom::VElement;
//!
//! let scheduler = Scheduler::new(Rc::new(LocalEventLoop::new()));
//! let doc = Document::new();
//! let body = doc.create_element("body", None);
//!
//! let root = create_root(&doc, &scheduler, body, None).unwrap();
//! root.render(VElement::new("p").child("hello")).unwrap();
//! assert_eq!(doc.inner_html(body), "<p>hello</p>");
//! ```

use std::rc::Rc;

use tracing::{debug, warn};

use crate::component::{Component, ComponentLayer};
use crate::error::Result;
use crate::host::{Document, HostNode};
use crate::scheduler::Scheduler;
use crate::vdom::VNode;

struct RootProps {
    children: VNode,
}

fn root_component() -> Component {
    Component::new("root", |props: &RootProps, _| Ok(props.children.clone()))
}

/// A mounted render tree.
#[derive(Debug)]
pub struct Root {
    layer: Rc<ComponentLayer>,
    scheduler: Scheduler,
}

/// Create a root rendering at the end of `container`.
///
/// When `initial` is given it is rendered through a regular flush before
/// this returns.
pub fn create_root(
    document: &Document,
    scheduler: &Scheduler,
    container: HostNode,
    initial: Option<VNode>,
) -> Result<Root> {
    create_root_at(document, scheduler, container, None, initial)
}

/// Create a root rendering into `container` before its child `adjacent`.
pub fn create_root_before(
    document: &Document,
    scheduler: &Scheduler,
    container: HostNode,
    adjacent: HostNode,
    initial: Option<VNode>,
) -> Result<Root> {
    create_root_at(document, scheduler, container, Some(adjacent), initial)
}

fn create_root_at(
    document: &Document,
    scheduler: &Scheduler,
    container: HostNode,
    adjacent: Option<HostNode>,
    initial: Option<VNode>,
) -> Result<Root> {
    let props = Rc::new(RootProps {
        children: VNode::Nothing,
    });
    let layer = ComponentLayer::root(document, scheduler, props);
    layer.mount(&root_component(), container, adjacent)?;
    debug!(?container, "root created");

    let root = Root {
        layer,
        scheduler: scheduler.clone(),
    };
    if let Some(initial) = initial {
        root.render(initial)?;
    }
    Ok(root)
}

impl Root {
    /// Replace the rendered tree and flush synchronously.
    ///
    /// A flush already running (for example, when called from an effect)
    /// picks the update up on its next pass instead.
    pub fn render(&self, vnode: impl Into<VNode>) -> Result<()> {
        if !self.layer.is_alive() {
            warn!("render called on an unmounted root");
            return Ok(());
        }
        self.layer.set_props(Rc::new(RootProps {
            children: vnode.into(),
        }));
        self.layer.schedule_update();
        self.scheduler.flush()
    }

    /// Tear the whole tree down, running every cleanup.
    pub fn unmount(&self) {
        debug!(alive = self.layer.is_alive(), "unmounting root");
        self.layer.unmount();
    }

    pub fn layer(&self) -> &Rc<ComponentLayer> {
        &self.layer
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
