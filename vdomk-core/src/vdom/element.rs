//! Virtual Elements
//!
//! A [`VElement`] describes one host element: its tag, optional key, an
//! ordered property map and an optional nested child node.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::host::{Event, HostNode};

use super::node::{Key, VArray, VNode};
use super::props::{EventHandler, PropValue, RefCallback};

/// Property map of an element. Insertion order is preserved so that props
/// are applied in the order they were written.
pub type PropMap = IndexMap<Rc<str>, PropValue>;

/// A host element description.
///
/// # Example
///
/// ```rust
/// use vdomk_core::vdom::{VElement, VNode};
///
/// let node: VNode = VElement::new("div")
///     .attr("class", "huh")
///     .child(VElement::new("span").child("Hey hey hey"))
///     .into();
/// ```
#[derive(Debug, Clone)]
pub struct VElement {
    pub tag: Rc<str>,
    pub key: Option<Key>,
    pub props: PropMap,
    pub children: Option<VNode>,
}

impl VElement {
    pub fn new(tag: impl Into<Rc<str>>) -> Self {
        Self {
            tag: tag.into(),
            key: None,
            props: PropMap::new(),
            children: None,
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set an arbitrary property.
    pub fn prop(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Alias of [`prop`](Self::prop) that reads better for attribute-like values.
    pub fn attr(self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        self.prop(name, value)
    }

    /// Attach an event listener. `event` is the bare event name (`"click"`);
    /// the property is stored as `on<event>`.
    pub fn on<F>(self, event: &str, handler: F) -> Self
    where
        F: Fn(&Event) + 'static,
    {
        self.prop(format!("on{event}"), EventHandler::new(handler))
    }

    /// Attach a ref callback.
    pub fn node_ref<F>(self, callback: F) -> Self
    where
        F: Fn(Option<HostNode>) + 'static,
    {
        self.prop("ref", RefCallback::new(callback))
    }

    /// Set the single nested child.
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children = Some(child.into());
        self
    }

    /// Set several children as an unkeyed fragment.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VNode>,
    {
        let items = children.into_iter().map(Into::into);
        self.children = Some(VArray::new(items).into());
        self
    }

    pub(crate) fn ref_callback(&self) -> Option<&RefCallback> {
        match self.props.get("ref") {
            Some(PropValue::Ref(callback)) => Some(callback),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_prop_order() {
        let el = VElement::new("input")
            .attr("type", "text")
            .prop("value", "x")
            .attr("tabIndex", 3);
        let names: Vec<&str> = el.props.keys().map(|k| &**k).collect();
        assert_eq!(names, ["type", "value", "tabIndex"]);
    }

    #[test]
    fn on_prefixes_event_names() {
        let el = VElement::new("button").on("click", |_| {});
        assert!(matches!(el.props.get("onclick"), Some(PropValue::Handler(_))));
    }

    #[test]
    fn children_builds_a_fragment() {
        let el = VElement::new("ul").children(["a", "b"]);
        match el.children {
            Some(VNode::Array(arr)) => assert_eq!(arr.len(), 2),
            other => panic!("expected an array, got {other:?}"),
        }
    }

    #[test]
    fn ref_callback_lookup() {
        let el = VElement::new("div").node_ref(|_| {});
        assert!(el.ref_callback().is_some());
        assert!(VElement::new("div").ref_callback().is_none());
    }
}
