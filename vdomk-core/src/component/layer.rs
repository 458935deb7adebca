//! Component Layer
//!
//! The stateful instance behind one mounted component.
//!
//! # Lifecycle
//!
//! ```text
//! constructing ──mount──▶ idle ⇄ pending ──unmount──▶ unmounted
//! ```
//!
//! A layer starts out pending so update requests made while its component
//! is first invoked are dropped. `schedule_update` moves an idle layer to
//! pending and queues it with the scheduler exactly once; the next
//! `run_update` renders it and returns it to idle. Unmounting is terminal:
//! cleanups run once, later update requests are ignored, and late cleanup
//! registrations run immediately.
//!
//! # Ownership
//!
//! The render node that holds a layer owns it. The layer owns the render
//! node for its output. Links toward the root (parent layer, scheduler) are
//! weak.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::host::{Document, EffectQueue, HostNode};
use crate::render::{diff, RNode};
use crate::scheduler::{Effect, Scheduler, WeakScheduler};
use crate::vdom::VNode;

use super::{Component, Instance, Props, RenderFn};

type Cleanup = Box<dyn FnOnce()>;

pub struct ComponentLayer {
    depth: usize,
    parent: Option<Weak<ComponentLayer>>,
    scheduler: WeakScheduler,
    config: Rc<RuntimeConfig>,
    document: Document,
    alive: Cell<bool>,
    pending: Cell<bool>,
    cleanup_queue: RefCell<SmallVec<[Cleanup; 2]>>,
    context: RefCell<Option<Rc<dyn Any>>>,
    render: RefCell<Option<RenderFn>>,
    props: RefCell<Props>,
    child: RefCell<Option<RNode>>,
}

impl ComponentLayer {
    /// A layer with no parent, at depth 0.
    pub(crate) fn root(document: &Document, scheduler: &Scheduler, props: Props) -> Rc<Self> {
        Rc::new(Self::build(
            0,
            None,
            scheduler.downgrade(),
            Rc::clone(scheduler.config()),
            document.clone(),
            props,
        ))
    }

    /// A layer nested under `parent`, one level deeper.
    pub(crate) fn child_of(parent: &Rc<Self>, props: Props) -> Rc<Self> {
        Rc::new(Self::build(
            parent.depth + 1,
            Some(Rc::downgrade(parent)),
            parent.scheduler.clone(),
            Rc::clone(&parent.config),
            parent.document.clone(),
            props,
        ))
    }

    fn build(
        depth: usize,
        parent: Option<Weak<Self>>,
        scheduler: WeakScheduler,
        config: Rc<RuntimeConfig>,
        document: Document,
        props: Props,
    ) -> Self {
        Self {
            depth,
            parent,
            scheduler,
            config,
            document,
            alive: Cell::new(true),
            pending: Cell::new(true),
            cleanup_queue: RefCell::new(SmallVec::new()),
            context: RefCell::new(None),
            render: RefCell::new(None),
            props: RefCell::new(props),
            child: RefCell::new(None),
        }
    }

    /// Invoke `component` for the first time and mount what it rendered
    /// into `parent` before `adjacent`.
    pub(crate) fn mount(
        self: &Rc<Self>,
        component: &Component,
        parent: HostNode,
        adjacent: Option<HostNode>,
    ) -> Result<()> {
        trace!(component = component.name(), depth = self.depth, "mounting component");
        let props = self.props();
        let (render, first) = component.resolve(&props, &Instance::new(self))?;
        *self.render.borrow_mut() = Some(render);
        self.pending.set(false);

        let child = RNode::mount(&first, parent, adjacent, self)?;
        self.store_child(child);
        Ok(())
    }

    /// Render again if an update is pending or `force` is set.
    pub fn run_update(self: &Rc<Self>, force: bool) -> Result<()> {
        if !self.alive.get() || !(self.pending.get() || force) {
            return Ok(());
        }
        let render = self.render.borrow().clone();
        let Some(render) = render else {
            return Ok(());
        };
        let props = self.props();
        let next = render(&props, &Instance::new(self));
        self.pending.set(false);
        self.finish_update(&next?)
    }

    fn finish_update(self: &Rc<Self>, next: &VNode) -> Result<()> {
        let taken = self.child.borrow_mut().take();
        let Some(mut child) = taken else {
            return Ok(());
        };
        let result = diff(&mut child, next, self);
        self.store_child(child);
        result
    }

    fn store_child(&self, mut child: RNode) {
        if self.alive.get() {
            *self.child.borrow_mut() = Some(child);
        } else {
            child.unmount(&self.document, true);
        }
    }

    /// Queue this layer with the scheduler unless it is unmounted or
    /// already queued.
    pub fn schedule_update(self: &Rc<Self>) {
        if !self.alive.get() || self.pending.get() {
            return;
        }
        match self.scheduler.upgrade() {
            Some(scheduler) => {
                self.pending.set(true);
                scheduler.enqueue_layer(self);
            }
            None => warn!(depth = self.depth, "update requested after the scheduler was dropped"),
        }
    }

    /// Tear the layer down: run cleanups newest first, then unmount the
    /// rendered subtree. Calling it again does nothing.
    pub fn unmount(&self) {
        if !self.alive.replace(false) {
            return;
        }
        trace!(depth = self.depth, "unmounting component");
        let cleanups = std::mem::take(&mut *self.cleanup_queue.borrow_mut());
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
        let child = self.child.borrow_mut().take();
        if let Some(mut child) = child {
            child.unmount(&self.document, true);
        }
    }

    pub(crate) fn register_cleanup(&self, cleanup: Cleanup) {
        if self.alive.get() {
            self.cleanup_queue.borrow_mut().push(cleanup);
        } else {
            cleanup();
        }
    }

    pub(crate) fn set_props(&self, props: Props) {
        *self.props.borrow_mut() = props;
    }

    pub fn props(&self) -> Props {
        Rc::clone(&self.props.borrow())
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    pub fn parent(&self) -> Option<Rc<Self>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn context(&self) -> Option<Rc<dyn Any>> {
        self.context.borrow().clone()
    }

    pub(crate) fn set_context(&self, marker: Rc<dyn Any>) {
        *self.context.borrow_mut() = Some(marker);
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl EffectQueue for ComponentLayer {
    fn enqueue_effect(&self, effect: Effect) {
        match self.scheduler.upgrade() {
            Some(scheduler) => scheduler.enqueue_effect(effect),
            None => effect(),
        }
    }
}

impl std::fmt::Debug for ComponentLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentLayer")
            .field("depth", &self.depth)
            .field("alive", &self.alive.get())
            .field("pending", &self.pending.get())
            .field("cleanups", &self.cleanup_queue.borrow().len())
            .field("provides_context", &self.context.borrow().is_some())
            .finish_non_exhaustive()
    }
}
