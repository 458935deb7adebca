//! vdomk Core
//!
//! This crate provides the reconciliation and scheduling core of the vdomk
//! UI library. It implements:
//!
//! - An immutable virtual node model
//! - A live render tree with keyed list reconciliation
//! - Component layers (mount, update, cleanup, unmount, effects)
//! - A depth-ordered update scheduler with microtask/macrotask deferral
//!
//! Rendering targets an in-process host [`Document`](host::Document), the
//! crate's stand-in for a browser DOM.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `vdom`: Virtual nodes, keys and property values
//! - `host`: The host document and the property binder
//! - `render`: Render nodes and the reconciler
//! - `component`: Component functions, layers, memo and context
//! - `scheduler`: Update batching, effect draining and event loops
//! - `root`: Entry point attaching a render tree to a container
//!
//! Everything is single-threaded: handles are `Rc`-based and deferred work
//! runs on a local event loop.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use vdomk_core::component::{Component, Instance};
//! use vdomk_core::host::Document;
//! use vdomk_core::root::create_root;
//! use vdomk_core::scheduler::{LocalEventLoop, Scheduler};
//! use vdomk_core::vdom::{VComponent, VElement, VNode};
//!
//! let event_loop = Rc::new(LocalEventLoop::new());
//! let scheduler = Scheduler::new(event_loop.clone());
//! let doc = Document::new();
//! let body = doc.create_element("body", None);
//!
//! // A two-phase component: setup runs once, the returned closure renders.
//! let counter = Component::with_setup("counter", |_: &(), instance: &Instance| {
//!     let count = Rc::new(Cell::new(0));
//!     let handle = instance.clone();
//!     let clicks = count.clone();
//!     Ok(move |_: &(), _: &Instance| -> vdomk_core::Result<VNode> {
//!         let clicks = clicks.clone();
//!         let handle = handle.clone();
//!         Ok(VElement::new("button")
//!             .on("click", move |_| {
//!                 clicks.set(clicks.get() + 1);
//!                 handle.schedule_update();
//!             })
//!             .child(count.get())
//!             .into())
//!     })
//! });
//!
//! let root = create_root(&doc, &scheduler, body, None).unwrap();
//! root.render(VComponent::new(&counter, ())).unwrap();
//! assert_eq!(doc.inner_html(body), "<button>0</button>");
//!
//! let button = doc.element_children(body)[0];
//! doc.dispatch(button, "click");
//! event_loop.run_until_idle().unwrap();
//! assert_eq!(doc.inner_html(body), "<button>1</button>");
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod render;
pub mod root;
pub mod scheduler;
pub mod vdom;

pub use config::RuntimeConfig;
pub use error::{Error, Result};
pub use render::diff;
pub use root::{create_root, create_root_before, Root};
pub use scheduler::Scheduler;
