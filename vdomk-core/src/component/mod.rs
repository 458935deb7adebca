//! Component Layer
//!
//! A component is a function from props to a [`VNode`](crate::vdom::VNode).
//! Every mounted component invocation is backed by a [`ComponentLayer`]: the
//! stateful instance that remembers the component's depth, liveness, pending
//! update, cleanup callbacks and context marker, and owns the render node
//! for whatever the component last returned.
//!
//! # Component forms
//!
//! - **One phase** ([`Component::new`]): the function is called on every
//!   render.
//! - **Two phase** ([`Component::with_setup`]): the function is called once on
//!   mount and returns the render function used for every later pass. State
//!   that lives as long as the instance is captured by that closure.
//!
//! Component functions receive an [`Instance`], the capability handle for
//! registering cleanups and effects and for requesting an update.

use std::any::Any;
use std::rc::Rc;

mod context;
mod function;
mod instance;
mod layer;
mod memo;

pub use context::{Context, ContextReader, ProviderProps};
pub use function::{Component, RenderFn, Rendered};
pub use instance::Instance;
pub use layer::ComponentLayer;
pub use memo::{memo, memo_by};

pub(crate) use function::downcast_props;

/// Type-erased component props. Identity (pointer equality) is what the
/// reconciler compares to decide whether a component must re-render.
pub type Props = Rc<dyn Any>;

/// Pointer identity of two props values.
pub(crate) fn same_props(a: &Props, b: &Props) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
