//! Virtual Node Model
//!
//! Virtual nodes are immutable descriptions of rendered content. A fresh tree
//! is produced on every render and discarded after it has been diffed
//! against the live render tree.
//!
//! There are five kinds:
//!
//! - elements (a host tag, a key, props and an optional nested child)
//! - components (a component function, a key and a props value)
//! - arrays (ordered fragments of siblings, optionally keyed themselves)
//! - text leaves (nothing, booleans, numbers and strings)
//! - portals (content rendered into another host container)
//!
//! The model has no behavior beyond classification: [`VNode::kind`],
//! [`VNode::key`] and the identity check [`VNode::is_same`].

mod element;
mod node;
mod props;

pub use element::{PropMap, VElement};
pub use node::{Key, VArray, VComponent, VKind, VNode, VPortal};
pub use props::{EventHandler, PropValue, RefCallback};
