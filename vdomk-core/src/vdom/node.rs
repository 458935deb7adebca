//! Virtual Nodes
//!
//! This module defines [`VNode`], the immutable description of what should be
//! rendered at one tree position, together with its kind tag and key.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::component::{Component, Props};
use crate::host::HostNode;

use super::element::VElement;

/// Identity of a sibling for keyed reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(Rc<str>),
    Int(i64),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// The kind of a virtual node. Leaf values (nothing, booleans, numbers and
/// strings) all share the `Text` kind because one live text node renders
/// any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VKind {
    Element,
    Component,
    Array,
    Text,
    Portal,
}

/// An immutable description of rendered content.
///
/// Cloning is cheap: the structured variants are reference counted, and
/// two clones of the same structured node are identical in the sense of
/// [`VNode::is_same`].
#[derive(Debug, Clone, Default)]
pub enum VNode {
    /// `null`/`undefined`: renders nothing.
    #[default]
    Nothing,
    /// Booleans render nothing as well; they exist so `cond && node` style
    /// expressions have somewhere to land.
    Bool(bool),
    Number(f64),
    Text(Rc<str>),
    Element(Rc<VElement>),
    Component(Rc<VComponent>),
    Array(Rc<VArray>),
    Portal(Rc<VPortal>),
}

impl VNode {
    pub fn text(text: impl Into<Rc<str>>) -> Self {
        Self::Text(text.into())
    }

    pub fn kind(&self) -> VKind {
        match self {
            Self::Nothing | Self::Bool(_) | Self::Number(_) | Self::Text(_) => VKind::Text,
            Self::Element(_) => VKind::Element,
            Self::Component(_) => VKind::Component,
            Self::Array(_) => VKind::Array,
            Self::Portal(_) => VKind::Portal,
        }
    }

    /// The reconciliation key, if any. Leaves are never keyed.
    pub fn key(&self) -> Option<&Key> {
        match self {
            Self::Element(el) => el.key.as_ref(),
            Self::Component(co) => co.key.as_ref(),
            Self::Array(arr) => arr.key.as_ref(),
            Self::Portal(portal) => portal.key.as_ref(),
            _ => None,
        }
    }

    /// Reference identity: pointer equality for shared nodes, value equality
    /// for leaves. Identical nodes are never diffed.
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nothing, Self::Nothing) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => Rc::ptr_eq(a, b) || a == b,
            (Self::Element(a), Self::Element(b)) => Rc::ptr_eq(a, b),
            (Self::Component(a), Self::Component(b)) => Rc::ptr_eq(a, b),
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Portal(a), Self::Portal(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// True for the leaves that render no visible content.
    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing | Self::Bool(_))
    }

    /// Text content of a leaf. Empty for nothing-like leaves and for every
    /// structured node.
    pub fn to_text(&self) -> String {
        match self {
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.to_string(),
            _ => String::new(),
        }
    }
}

/// Format a number the way script hosts print it: `NaN`, `Infinity`, no
/// trailing `.0`, and exponent notation outside `[1e-6, 1e21)`.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return n.to_string();
    }
    let formatted = format!("{n:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
        _ => formatted,
    }
}

/// An ordered fragment of sibling nodes.
#[derive(Debug, Clone, Default)]
pub struct VArray {
    pub key: Option<Key>,
    pub items: Vec<VNode>,
}

impl VArray {
    pub fn new(items: impl IntoIterator<Item = VNode>) -> Self {
        Self {
            key: None,
            items: items.into_iter().collect(),
        }
    }

    /// A fragment that itself carries a key within its own sibling list.
    pub fn keyed(key: impl Into<Key>, items: impl IntoIterator<Item = VNode>) -> Self {
        Self {
            key: Some(key.into()),
            items: items.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A component invocation.
#[derive(Clone)]
pub struct VComponent {
    pub component: Component,
    pub key: Option<Key>,
    pub props: Props,
}

impl VComponent {
    pub fn new<P: Any>(component: &Component, props: P) -> Self {
        Self {
            component: component.clone(),
            key: None,
            props: Rc::new(props),
        }
    }

    /// Build from an already shared props value, keeping its identity.
    pub fn with_props(component: &Component, props: Props) -> Self {
        Self {
            component: component.clone(),
            key: None,
            props,
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl fmt::Debug for VComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VComponent")
            .field("component", &self.component.name())
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Content rendered into a different host container than its position in
/// the tree.
#[derive(Debug, Clone)]
pub struct VPortal {
    pub key: Option<Key>,
    pub container: HostNode,
    pub adjacent: Option<HostNode>,
    pub children: VNode,
}

impl VPortal {
    pub fn new(container: HostNode, children: impl Into<VNode>) -> Self {
        Self {
            key: None,
            container,
            adjacent: None,
            children: children.into(),
        }
    }

    /// Insert the portal content before `adjacent` instead of at the end of
    /// the container.
    pub fn before(mut self, adjacent: HostNode) -> Self {
        self.adjacent = Some(adjacent);
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl From<&str> for VNode {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for VNode {
    fn from(value: String) -> Self {
        Self::Text(value.into())
    }
}

impl From<Rc<str>> for VNode {
    fn from(value: Rc<str>) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for VNode {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for VNode {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for VNode {
    fn from(value: i64) -> Self {
        // Precision loss past 2^53 matches how the host represents numbers.
        Self::Number(value as f64)
    }
}

impl From<bool> for VNode {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<()> for VNode {
    fn from(_: ()) -> Self {
        Self::Nothing
    }
}

impl<T: Into<VNode>> From<Option<T>> for VNode {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nothing, Into::into)
    }
}

impl From<Vec<VNode>> for VNode {
    fn from(items: Vec<VNode>) -> Self {
        Self::Array(Rc::new(VArray::new(items)))
    }
}

impl From<VArray> for VNode {
    fn from(value: VArray) -> Self {
        Self::Array(Rc::new(value))
    }
}

impl From<VElement> for VNode {
    fn from(value: VElement) -> Self {
        Self::Element(Rc::new(value))
    }
}

impl From<VComponent> for VNode {
    fn from(value: VComponent) -> Self {
        Self::Component(Rc::new(value))
    }
}

impl From<VPortal> for VNode {
    fn from(value: VPortal) -> Self {
        Self::Portal(Rc::new(value))
    }
}
