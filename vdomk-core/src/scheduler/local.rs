//! Deterministic event loop.
//!
//! Two FIFO queues driven by hand: microtasks drain completely before the
//! next macrotask starts, the same ordering a browser event loop gives.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::Result;

use super::defer::{Defer, EventLoop, Task};

#[derive(Default)]
pub struct LocalEventLoop {
    microtasks: RefCell<VecDeque<Task>>,
    tasks: RefCell<VecDeque<Task>>,
}

impl LocalEventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run microtasks until the queue is empty, including ones queued while
    /// draining. Stops at the first error.
    pub fn run_microtasks(&self) -> Result<()> {
        loop {
            let next = self.microtasks.borrow_mut().pop_front();
            match next {
                Some(task) => task()?,
                None => return Ok(()),
            }
        }
    }

    /// Run one macrotask followed by every microtask it produced.
    /// Returns `false` when there was nothing to run.
    pub fn run_next_task(&self) -> Result<bool> {
        let next = self.tasks.borrow_mut().pop_front();
        match next {
            Some(task) => {
                task()?;
                self.run_microtasks()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run everything until both queues are empty.
    pub fn run_until_idle(&self) -> Result<()> {
        self.run_microtasks()?;
        while self.run_next_task()? {}
        Ok(())
    }

    pub fn pending_microtasks(&self) -> usize {
        self.microtasks.borrow().len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl EventLoop for LocalEventLoop {
    fn defer(&self, when: Defer, task: Task) {
        match when {
            Defer::Microtask => self.microtasks.borrow_mut().push_back(task),
            Defer::Task => self.tasks.borrow_mut().push_back(task),
        }
    }
}

impl std::fmt::Debug for LocalEventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEventLoop")
            .field("microtasks", &self.pending_microtasks())
            .field("tasks", &self.pending_tasks())
            .finish()
    }
}
