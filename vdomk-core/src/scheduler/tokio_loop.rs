//! Tokio-backed event loop.
//!
//! Deferred work is spawned onto the current [`tokio::task::LocalSet`], so
//! this loop only works from inside one (`LocalSet::run_until` or
//! `LocalSet::block_on`). A macrotask yields to the runtime once before it
//! runs; a microtask runs on the next poll of the local set.
//!
//! There is no caller to hand an error back to, so task failures are logged
//! and dropped.

use super::defer::{Defer, EventLoop, Task};

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioEventLoop;

impl TokioEventLoop {
    pub fn new() -> Self {
        Self
    }
}

impl EventLoop for TokioEventLoop {
    fn defer(&self, when: Defer, task: Task) {
        tokio::task::spawn_local(async move {
            if when == Defer::Task {
                tokio::task::yield_now().await;
            }
            if let Err(err) = task() {
                tracing::error!(error = %err, "deferred render task failed");
            }
        });
    }
}
