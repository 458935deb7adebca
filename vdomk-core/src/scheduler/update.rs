//! Update Scheduler
//!
//! The scheduler collects component layers that asked to be updated and
//! effects that must run after rendering, then flushes them together.
//!
//! # Algorithm
//!
//! 1. A layer that schedules itself is appended to the pending list and a
//!    flush is armed on the event loop.
//! 2. A flush takes the whole pending list as one batch and sorts it by
//!    ascending depth, so parents update before their children. A parent's
//!    update may replace or unmount a child; the child's own queued update
//!    then finds it already current (or dead) and does nothing.
//! 3. Layers queued while the batch runs are not merged into it; they armed
//!    a new flush of their own.
//! 4. Effects registered during the flush are drained newest first. Effects
//!    registered while draining are drained in another pass, until none are
//!    left.
//! 5. If a layer fails to render, the layers after it in the batch stay
//!    queued, the effects collected so far are drained, and the error is
//!    returned.
//!
//! # Timing
//!
//! Right after a flush, further requests arm the next flush on a microtask
//! so a burst of updates coalesces into one pass. Once a macrotask boundary
//! has passed, requests arm on a macrotask instead.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::component::ComponentLayer;
use crate::config::RuntimeConfig;
use crate::error::{Error, Result};

use super::defer::{Defer, EventLoop, TriggerLast};

/// A callback deferred until the current flush has finished rendering.
pub type Effect = Box<dyn FnOnce()>;

struct SchedulerInner {
    event_loop: Rc<dyn EventLoop>,
    config: Rc<RuntimeConfig>,
    pending_layers: RefCell<Vec<Weak<ComponentLayer>>>,
    /// `Some` while a flush is running; effects queue here instead of running.
    pending_effects: RefCell<Option<Vec<Effect>>>,
    flushing: Cell<bool>,
    flushed_recently: Rc<Cell<bool>>,
    flush_trigger: TriggerLast,
    recent_trigger: TriggerLast,
}

/// Handle to the update scheduler. Clones share the same queues.
///
/// One scheduler is normally created per process and handed to every root;
/// roots that should batch independently can be given separate schedulers.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

/// Non-owning handle held by component layers.
#[derive(Clone, Default)]
pub struct WeakScheduler {
    inner: Weak<SchedulerInner>,
}

impl WeakScheduler {
    pub fn upgrade(&self) -> Option<Scheduler> {
        self.inner.upgrade().map(|inner| Scheduler { inner })
    }
}

/// Resets the flush state however the flush ends.
struct FlushGuard<'a> {
    inner: &'a SchedulerInner,
}

impl<'a> FlushGuard<'a> {
    fn enter(inner: &'a SchedulerInner) -> Self {
        inner.flushing.set(true);
        *inner.pending_effects.borrow_mut() = Some(Vec::new());
        Self { inner }
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.inner.flushing.set(false);
        *self.inner.pending_effects.borrow_mut() = None;
    }
}

impl Scheduler {
    /// Create a scheduler that defers onto `event_loop`.
    pub fn new(event_loop: Rc<dyn EventLoop>) -> Self {
        Self::with_config(event_loop, RuntimeConfig::default())
    }

    /// Create a scheduler with explicit runtime configuration.
    pub fn with_config(event_loop: Rc<dyn EventLoop>, config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                event_loop,
                config: Rc::new(config),
                pending_layers: RefCell::new(Vec::new()),
                pending_effects: RefCell::new(None),
                flushing: Cell::new(false),
                flushed_recently: Rc::new(Cell::new(false)),
                flush_trigger: TriggerLast::new(),
                recent_trigger: TriggerLast::new(),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakScheduler {
        WeakScheduler {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &Rc<RuntimeConfig> {
        &self.inner.config
    }

    /// Queue a layer for update and arm a flush.
    ///
    /// Callers guarantee a layer is queued at most once at a time; the layer's
    /// own `pending` flag enforces it.
    pub fn enqueue_layer(&self, layer: &Rc<ComponentLayer>) {
        self.inner.pending_layers.borrow_mut().push(Rc::downgrade(layer));
        let when = if self.inner.flushed_recently.get() {
            Defer::Microtask
        } else {
            Defer::Task
        };
        trace!(depth = layer.depth(), ?when, "layer queued");

        let weak = Rc::downgrade(&self.inner);
        self.inner
            .flush_trigger
            .arm(&*self.inner.event_loop, when, move || match weak.upgrade() {
                Some(inner) => Scheduler { inner }.flush(),
                None => Ok(()),
            });
    }

    /// Queue an effect for the end of the running flush, or run it right away
    /// when no flush is running.
    pub fn enqueue_effect(&self, effect: Effect) {
        let immediate = {
            let mut pending = self.inner.pending_effects.borrow_mut();
            match pending.as_mut() {
                Some(queue) => {
                    queue.push(effect);
                    None
                }
                None => Some(effect),
            }
        };
        if let Some(effect) = immediate {
            effect();
        }
    }

    /// Run every pending layer update in depth order, then drain effects.
    ///
    /// A flush requested while one is already running returns immediately;
    /// the outer flush (or the flush armed by the request) covers it.
    pub fn flush(&self) -> Result<()> {
        let inner = &*self.inner;
        if inner.flushing.get() || inner.pending_layers.borrow().is_empty() {
            return Ok(());
        }
        let _guard = FlushGuard::enter(inner);

        inner.flushed_recently.set(true);
        let recent = Rc::clone(&inner.flushed_recently);
        inner
            .recent_trigger
            .arm(&*inner.event_loop, Defer::Task, move || {
                recent.set(false);
                Ok(())
            });

        let queued = std::mem::take(&mut *inner.pending_layers.borrow_mut());
        let mut batch: Vec<Rc<ComponentLayer>> =
            queued.into_iter().filter_map(|layer| layer.upgrade()).collect();
        batch.sort_by_key(|layer| layer.depth());
        debug!(layers = batch.len(), "flushing update batch");

        for (index, layer) in batch.iter().enumerate() {
            if let Err(err) = layer.run_update(false) {
                // the rest of the batch stays queued for the next flush
                let rest = batch[index + 1..].iter().map(Rc::downgrade);
                inner.pending_layers.borrow_mut().extend(rest);
                // effects of the layers that did render still run
                if let Err(effect_err) = self.drain_effects() {
                    warn!(error = %effect_err, "effects after a failed update did not settle");
                }
                return Err(err);
            }
        }

        self.drain_effects()
    }

    fn drain_effects(&self) -> Result<()> {
        let limit = self.inner.config.max_effect_passes;
        let mut passes = 0;
        loop {
            let effects = self
                .inner
                .pending_effects
                .borrow_mut()
                .as_mut()
                .map(std::mem::take)
                .unwrap_or_default();
            if effects.is_empty() {
                return Ok(());
            }
            passes += 1;
            if let Some(limit) = limit {
                if passes > limit {
                    return Err(Error::EffectLoop(limit));
                }
            }
            trace!(effects = effects.len(), pass = passes, "draining effects");
            for effect in effects.into_iter().rev() {
                effect();
            }
        }
    }

    /// Number of layers waiting for the next flush.
    pub fn pending_layers(&self) -> usize {
        self.inner.pending_layers.borrow().len()
    }

    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.get()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending_layers", &self.pending_layers())
            .field("flushing", &self.is_flushing())
            .field("flushed_recently", &self.inner.flushed_recently.get())
            .finish()
    }
}

impl std::fmt::Debug for WeakScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakScheduler")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::LocalEventLoop;

    fn scheduler() -> (Rc<LocalEventLoop>, Scheduler) {
        let event_loop = Rc::new(LocalEventLoop::new());
        let scheduler = Scheduler::new(event_loop.clone());
        (event_loop, scheduler)
    }

    #[test]
    fn effects_run_immediately_outside_a_flush() {
        let (_, scheduler) = scheduler();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        scheduler.enqueue_effect(Box::new(move || flag.set(true)));
        assert!(ran.get());
    }

    #[test]
    fn flush_without_pending_layers_is_a_no_op() {
        let (event_loop, scheduler) = scheduler();
        scheduler.flush().unwrap();
        assert!(!scheduler.is_flushing());
        assert_eq!(event_loop.pending_tasks(), 0);
    }

    #[test]
    fn effect_drain_loops_until_quiet() {
        let (_, scheduler) = scheduler();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let _guard = FlushGuard::enter(&scheduler.inner);
            for name in ["first", "second"] {
                let log = log.clone();
                let nested = scheduler.clone();
                scheduler.enqueue_effect(Box::new(move || {
                    log.borrow_mut().push(name);
                    if name == "first" {
                        let log = log.clone();
                        nested.enqueue_effect(Box::new(move || log.borrow_mut().push("nested")));
                    }
                }));
            }
            scheduler.drain_effects().unwrap();
        }
        assert_eq!(*log.borrow(), ["second", "first", "nested"]);
    }

    #[test]
    fn effect_pass_limit_is_enforced() {
        let event_loop = Rc::new(LocalEventLoop::new());
        let config = RuntimeConfig {
            max_effect_passes: Some(3),
            ..RuntimeConfig::default()
        };
        let scheduler = Scheduler::with_config(event_loop, config);

        fn respawn(scheduler: Scheduler) -> Effect {
            let next = scheduler.clone();
            Box::new(move || next.enqueue_effect(respawn(next.clone())))
        }

        let _guard = FlushGuard::enter(&scheduler.inner);
        scheduler.enqueue_effect(respawn(scheduler.clone()));
        assert!(matches!(scheduler.drain_effects(), Err(Error::EffectLoop(3))));
    }

    #[test]
    fn weak_handle_follows_the_scheduler() {
        let (_, scheduler) = scheduler();
        let weak = scheduler.downgrade();
        assert!(weak.upgrade().is_some());
        drop(scheduler);
        assert!(weak.upgrade().is_none());
    }
}
