//! Deferral Primitives
//!
//! The scheduler never flushes synchronously in response to an update
//! request. It arms a deferred callback instead, on one of two queues:
//!
//! - a microtask, which runs before control returns to the event loop and
//!   is used to coalesce bursts of updates
//! - a macrotask, which runs on a later turn of the event loop and gives
//!   other pending work a chance to go first
//!
//! [`TriggerLast`] wraps either queue in a debounce-to-latest pattern: each
//! arm bumps a generation counter and only the callback armed last will run.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::Result;

/// A deferred unit of work. Errors surface from whatever drives the loop.
pub type Task = Box<dyn FnOnce() -> Result<()>>;

/// Which queue a deferred task goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defer {
    Microtask,
    Task,
}

/// A single-threaded event loop the scheduler can defer work onto.
pub trait EventLoop {
    fn defer(&self, when: Defer, task: Task);
}

/// Debounce-to-latest: only the most recently armed callback runs, stale
/// ones detect it through the generation counter and do nothing.
#[derive(Debug, Default)]
pub struct TriggerLast {
    generation: Rc<Cell<u64>>,
}

impl TriggerLast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `callback` on `event_loop`, superseding any callback armed earlier.
    pub fn arm<F>(&self, event_loop: &dyn EventLoop, when: Defer, callback: F)
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        let current = self.generation.get() + 1;
        self.generation.set(current);
        let generation = Rc::clone(&self.generation);
        event_loop.defer(
            when,
            Box::new(move || {
                if generation.get() != current {
                    return Ok(());
                }
                callback()
            }),
        );
    }

    /// Number of times this trigger has been armed.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }
}
