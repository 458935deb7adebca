//! Host Tree
//!
//! The host side of rendering: an in-process [`Document`] that the render
//! tree mirrors virtual nodes into, and the property binder that applies
//! individual prop changes to its nodes.

pub mod binder;
mod document;
mod node;

pub use binder::{apply_property, EffectQueue};
pub use document::{Document, SVG_NS};
pub use node::{Event, HostNode, HostNodeKind};
