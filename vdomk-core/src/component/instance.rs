//! The capability handle passed to component functions.

use std::any::Any;
use std::rc::{Rc, Weak};

use crate::host::EffectQueue;

use super::ComponentLayer;

/// Handle to the layer a component function is running in.
///
/// It holds the layer weakly, so closures may capture and keep it past the
/// component's unmount. Every operation on a handle whose layer is gone is
/// defined: cleanups and effects run immediately, update requests are
/// ignored.
#[derive(Clone)]
pub struct Instance {
    layer: Weak<ComponentLayer>,
}

impl Instance {
    pub(crate) fn new(layer: &Rc<ComponentLayer>) -> Self {
        Self {
            layer: Rc::downgrade(layer),
        }
    }

    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self { layer: Weak::new() }
    }

    /// Register a callback to run when the component unmounts. Callbacks run
    /// in reverse registration order. On an unmounted component the
    /// callback runs right away.
    pub fn cleanup<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        match self.layer.upgrade() {
            Some(layer) => layer.register_cleanup(Box::new(callback)),
            None => callback(),
        }
    }

    /// Run `callback` after the current flush has finished rendering.
    pub fn effect<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        match self.layer.upgrade() {
            Some(layer) => layer.enqueue_effect(Box::new(callback)),
            None => callback(),
        }
    }

    /// Ask for this component to be rendered again on the next flush.
    pub fn schedule_update(&self) {
        if let Some(layer) = self.layer.upgrade() {
            layer.schedule_update();
        }
    }

    pub fn is_alive(&self) -> bool {
        self.layer.upgrade().is_some_and(|layer| layer.is_alive())
    }

    /// Distance of the component from its root, if it still exists.
    pub fn depth(&self) -> Option<usize> {
        self.layer.upgrade().map(|layer| layer.depth())
    }

    /// Publish a context marker on this component's layer for descendants
    /// to find.
    pub fn provide(&self, marker: Rc<dyn Any>) {
        if let Some(layer) = self.layer.upgrade() {
            layer.set_context(marker);
        }
    }

    pub(crate) fn layer(&self) -> Option<Rc<ComponentLayer>> {
        self.layer.upgrade()
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("depth", &self.depth())
            .field("alive", &self.is_alive())
            .finish()
    }
}
