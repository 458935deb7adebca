//! Update Scheduling
//!
//! Components never re-render synchronously when they ask for an update.
//! They queue themselves with a [`Scheduler`], which flushes every queued
//! component in depth order on a later turn of an [`EventLoop`], then runs
//! the effects the flush produced.
//!
//! Two event loops are provided:
//!
//! - [`LocalEventLoop`]: queues driven by hand, for tests and embedding
//! - [`TokioEventLoop`]: spawns onto a tokio `LocalSet`

mod defer;
mod local;
mod tokio_loop;
mod update;

pub use defer::{Defer, EventLoop, Task, TriggerLast};
pub use local::LocalEventLoop;
pub use tokio_loop::TokioEventLoop;
pub use update::{Effect, Scheduler, WeakScheduler};
