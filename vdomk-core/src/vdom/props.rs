//! Property Values
//!
//! Values that can be attached to a virtual element under a property name.
//! Plain values end up as host fields or attributes; handlers and refs are
//! callbacks and compare by pointer identity, the same way closures compare
//! in the host.

use std::fmt;
use std::rc::Rc;

use crate::host::{Event, HostNode};

use super::node::format_number;

/// An event listener attached through an `on*` property.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Event) + 'static,
    {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
    }
}

/// A callback that receives the host node once it is in place, and `None`
/// when the element goes away or the callback is swapped for another one.
#[derive(Clone)]
pub struct RefCallback(Rc<dyn Fn(Option<HostNode>)>);

impl RefCallback {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Option<HostNode>) + 'static,
    {
        Self(Rc::new(callback))
    }

    pub fn call(&self, node: Option<HostNode>) {
        (self.0)(node)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RefCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefCallback({:p})", Rc::as_ptr(&self.0))
    }
}

/// A single property value.
#[derive(Debug, Clone)]
pub enum PropValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Handler(EventHandler),
    Ref(RefCallback),
}

impl PropValue {
    /// Strict identity, the check the binder uses to skip unchanged values.
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => a.ptr_eq(b),
            (Self::Ref(a), Self::Ref(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text used when the value is written as an attribute.
    /// Callbacks have no attribute form.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Self::Null | Self::Handler(_) | Self::Ref(_) => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_number(*n)),
            Self::Str(s) => Some(s.to_string()),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        Self::Handler(value)
    }
}

impl From<RefCallback> for PropValue {
    fn from(value: RefCallback) -> Self {
        Self::Ref(value)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_compare_by_value() {
        assert!(PropValue::from("a").is_same(&PropValue::from("a")));
        assert!(PropValue::from(3).is_same(&PropValue::Number(3.0)));
        assert!(!PropValue::from(true).is_same(&PropValue::from("true")));
        assert!(!PropValue::Number(f64::NAN).is_same(&PropValue::Number(f64::NAN)));
    }

    #[test]
    fn numeric_attributes_use_script_formatting() {
        assert_eq!(PropValue::from(3).to_attribute().as_deref(), Some("3"));
        assert_eq!(PropValue::Number(1e21).to_attribute().as_deref(), Some("1e+21"));
        assert_eq!(PropValue::Number(f64::INFINITY).to_attribute().as_deref(), Some("Infinity"));
    }

    #[test]
    fn callbacks_compare_by_pointer() {
        let handler = EventHandler::new(|_| {});
        let same = PropValue::Handler(handler.clone());
        let other = PropValue::Handler(EventHandler::new(|_| {}));
        assert!(PropValue::Handler(handler).is_same(&same));
        assert!(!same.is_same(&other));
    }

    #[test]
    fn attribute_text() {
        assert_eq!(PropValue::from(1.5).to_attribute().as_deref(), Some("1.5"));
        assert_eq!(PropValue::from(false).to_attribute().as_deref(), Some("false"));
        assert_eq!(PropValue::Null.to_attribute(), None);
    }
}
