//! Error Types
//!
//! Every fallible operation in the crate returns [`Result`]. There is no
//! error containment: an error raised by a component function travels out of
//! the reconciler, out of the layer update that invoked it, out of the
//! scheduler flush, and finally out of whatever triggered the flush.

use crate::host::HostNode;
use crate::vdom::Key;

/// Errors produced while rendering.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A component function failed. Wraps whatever the component returned.
    #[error("component render failed: {0}")]
    Render(#[source] Box<dyn std::error::Error + 'static>),

    /// A component received props of a type it cannot read.
    #[error("component `{component}` expected props of type `{expected}`")]
    PropsType {
        component: &'static str,
        expected: &'static str,
    },

    /// A live node lost its place in the host tree.
    #[error("host node {0:?} is not attached to a parent")]
    Detached(HostNode),

    /// A host node handle that the document no longer (or never) knew.
    #[error("host node {0:?} does not exist in the document")]
    UnknownNode(HostNode),

    /// Two keyed siblings shared a key and the runtime is configured to reject it.
    #[error("duplicate key {0} among siblings")]
    DuplicateKey(Key),

    /// Effects kept scheduling more effects past the configured limit.
    #[error("effects did not settle after {0} passes")]
    EffectLoop(usize),

    /// The runtime configuration could not be parsed.
    #[error("invalid runtime configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an arbitrary error (or message) raised by a component.
    pub fn render<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + 'static>>,
    {
        Self::Render(err.into())
    }
}

/// Convenience Result type with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
