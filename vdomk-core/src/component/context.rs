//! Context Propagation
//!
//! A [`Context`] lets a component publish a value to every descendant
//! without threading it through props.
//!
//! # How it works
//!
//! 1. The provider is a two-phase component. On mount it stores a
//!    [`ContextData`] marker (the value plus a subscriber list) on its own
//!    layer.
//! 2. A descendant subscribing walks from its own layer up through its
//!    ancestors until it finds a marker that belongs to this context, then
//!    adds a subscriber to it. The subscriber is removed again by a cleanup
//!    callback when the descendant unmounts.
//! 3. When the provider re-renders with a value that is not equal to the
//!    stored one, it stores the new value and notifies every subscriber,
//!    which schedules the subscribing component for an update.
//!
//! A selecting subscriber only schedules when the part of the value it
//! selected changed.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tracing::trace;

use crate::error::Result;
use crate::vdom::{VComponent, VNode};

use super::{Component, Instance};

/// Unique identifier of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SubscriberId(u64);

impl SubscriberId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

fn next_context_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

type Equality<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Props of a context provider.
pub struct ProviderProps<T> {
    pub value: T,
    pub children: VNode,
}

/// The marker a provider stores on its layer.
struct ContextData<T> {
    context: u64,
    value: RefCell<T>,
    subscribers: RefCell<IndexMap<SubscriberId, Rc<dyn Fn()>>>,
}

impl<T: Clone> ContextData<T> {
    fn update(&self, value: &T, equal: &dyn Fn(&T, &T) -> bool) {
        if equal(&self.value.borrow(), value) {
            return;
        }
        *self.value.borrow_mut() = value.clone();

        let subscribers: Vec<Rc<dyn Fn()>> = self.subscribers.borrow().values().cloned().collect();
        trace!(context = self.context, subscribers = subscribers.len(), "context value changed");
        for notify in subscribers {
            notify();
        }
    }
}

impl<T: 'static> ContextData<T> {
    fn attach(self: &Rc<Self>, instance: &Instance, notify: Rc<dyn Fn()>) {
        let id = SubscriberId::new();
        self.subscribers.borrow_mut().insert(id, notify);
        let data = Rc::downgrade(self);
        instance.cleanup(move || {
            if let Some(data) = data.upgrade() {
                data.subscribers.borrow_mut().shift_remove(&id);
            }
        });
    }
}

/// Reads the current value of a subscription.
pub struct ContextReader<T> {
    read: Rc<dyn Fn() -> T>,
}

impl<T> ContextReader<T> {
    fn new<F>(read: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self {
            read: Rc::new(read),
        }
    }

    pub fn get(&self) -> T {
        (self.read)()
    }
}

impl<T> Clone for ContextReader<T> {
    fn clone(&self) -> Self {
        Self {
            read: Rc::clone(&self.read),
        }
    }
}

struct ContextInner<T> {
    id: u64,
    default: T,
    provider: Component,
}

/// A value published by a provider component to its descendants.
///
/// # Example
///
/// ```rust
/// use vdomk_core::component::{Component, Context, Instance};
/// use vdomk_core::vdom::VNode;
///
/// let theme = Context::new("light");
/// let reader_theme = theme.clone();
/// let label = Component::with_setup("label", move |_: &(), instance: &Instance| {
///     let current = reader_theme.subscribe(instance);
///     Ok(move |_: &(), _: &Instance| -> vdomk_core::Result<VNode> {
///         Ok(VNode::text(current.get()))
///     })
/// });
/// let tree = theme.provider("dark", vdomk_core::vdom::VComponent::new(&label, ()));
/// # let _ = tree;
/// ```
pub struct Context<T> {
    inner: Rc<ContextInner<T>>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Context<T> {
    /// A context whose provider notifies when the value changes by `==`.
    pub fn new(default: T) -> Self {
        Self::with_equality(default, |a, b| a == b)
    }
}

impl<T: Clone + 'static> Context<T> {
    /// A context whose provider notifies when `equal` reports a change.
    pub fn with_equality<E>(default: T, equal: E) -> Self
    where
        E: Fn(&T, &T) -> bool + 'static,
    {
        let id = next_context_id();
        let equal: Equality<T> = Rc::new(equal);
        let provider = Component::with_setup(
            "context provider",
            move |props: &ProviderProps<T>, instance: &Instance| {
                let data = Rc::new(ContextData {
                    context: id,
                    value: RefCell::new(props.value.clone()),
                    subscribers: RefCell::new(IndexMap::new()),
                });
                instance.provide(data.clone());
                let equal = Rc::clone(&equal);
                Ok(move |props: &ProviderProps<T>, _: &Instance| -> Result<VNode> {
                    data.update(&props.value, &*equal);
                    Ok(props.children.clone())
                })
            },
        );
        Self {
            inner: Rc::new(ContextInner {
                id,
                default,
                provider,
            }),
        }
    }

    /// A provider node publishing `value` to everything under `children`.
    pub fn provider(&self, value: T, children: impl Into<VNode>) -> VNode {
        let props = ProviderProps {
            value,
            children: children.into(),
        };
        VComponent::new(&self.inner.provider, props).into()
    }

    /// Subscribe the component behind `instance` to the nearest provider.
    /// Without a provider the reader returns the default value.
    pub fn subscribe(&self, instance: &Instance) -> ContextReader<T> {
        let Some(data) = self.find(instance) else {
            let default = self.inner.default.clone();
            return ContextReader::new(move || default.clone());
        };
        let target = instance.clone();
        data.attach(instance, Rc::new(move || target.schedule_update()));
        ContextReader::new(move || data.value.borrow().clone())
    }

    /// Subscribe to a projection of the value. The component is only
    /// scheduled when `equal` reports that the projection changed.
    pub fn select<S, F, E>(&self, instance: &Instance, selector: F, equal: E) -> ContextReader<S>
    where
        S: Clone + 'static,
        F: Fn(&T) -> S + 'static,
        E: Fn(&S, &S) -> bool + 'static,
    {
        let Some(data) = self.find(instance) else {
            let selected = selector(&self.inner.default);
            return ContextReader::new(move || selected.clone());
        };
        let selector = Rc::new(selector);
        let last = RefCell::new(selector(&data.value.borrow()));

        let source = Rc::downgrade(&data);
        let project = Rc::clone(&selector);
        let target = instance.clone();
        data.attach(
            instance,
            Rc::new(move || {
                let Some(data) = source.upgrade() else {
                    return;
                };
                let next = project(&data.value.borrow());
                if equal(&last.borrow(), &next) {
                    return;
                }
                *last.borrow_mut() = next;
                target.schedule_update();
            }),
        );
        ContextReader::new(move || selector(&data.value.borrow()))
    }

    fn find(&self, instance: &Instance) -> Option<Rc<ContextData<T>>> {
        let mut layer = instance.layer();
        while let Some(current) = layer {
            if let Some(marker) = current.context() {
                if let Ok(data) = marker.downcast::<ContextData<T>>() {
                    if data.context == self.inner.id {
                        return Some(data);
                    }
                }
            }
            layer = current.parent();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn subscribing_without_a_provider_reads_the_default() {
        let context = Context::new(7);
        let reader = context.subscribe(&Instance::detached());
        assert_eq!(reader.get(), 7);
        let doubled = context.select(&Instance::detached(), |v| v * 2, |a: &i32, b: &i32| a == b);
        assert_eq!(doubled.get(), 14);
    }

    #[test]
    fn update_notifies_only_on_change() {
        let data = Rc::new(ContextData {
            context: 0,
            value: RefCell::new(1),
            subscribers: RefCell::new(IndexMap::new()),
        });
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        data.attach(&Instance::detached(), Rc::new(move || counter.set(counter.get() + 1)));

        // a detached instance runs the removal cleanup right away
        assert!(data.subscribers.borrow().is_empty());

        let counter = hits.clone();
        data.subscribers
            .borrow_mut()
            .insert(SubscriberId::new(), Rc::new(move || counter.set(counter.get() + 1)));
        let equal = |a: &i32, b: &i32| a == b;
        data.update(&1, &equal);
        assert_eq!(hits.get(), 0);
        data.update(&2, &equal);
        assert_eq!(hits.get(), 1);
        assert_eq!(*data.value.borrow(), 2);
    }

    #[test]
    fn subscriber_ids_are_unique() {
        assert_ne!(SubscriberId::new(), SubscriberId::new());
    }
}
