//! Memoized components.
//!
//! A memo wrapper renders the wrapped component and keeps handing back the
//! very same virtual node while the props stay equal. The reconciler sees an
//! identical node and skips the whole subtree.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::vdom::{VComponent, VNode};

use super::{downcast_props, Component, Instance, Props, RenderFn, Rendered};

/// Wrap `component` so it only re-renders when its props change by `==`.
pub fn memo<P>(component: &Component) -> Component
where
    P: PartialEq + 'static,
{
    memo_by::<P, _>(component, |a, b| a == b)
}

/// Wrap `component` so it only re-renders when `equal` reports the new
/// props differ from the last rendered ones.
pub fn memo_by<P, F>(component: &Component, equal: F) -> Component
where
    P: Any,
    F: Fn(&P, &P) -> bool + 'static,
{
    let inner = component.clone();
    let equal = Rc::new(equal);
    Component::from_fn("memo", move |_, _| {
        let inner = inner.clone();
        let equal = Rc::clone(&equal);
        let last: RefCell<Option<(Props, VNode)>> = RefCell::new(None);
        let render: RenderFn = Rc::new(move |props: &Props, _: &Instance| -> Result<VNode> {
            let next = downcast_props::<P>(props, inner.name())?;
            let mut last = last.borrow_mut();
            if let Some((previous, node)) = last.as_ref() {
                if equal(downcast_props::<P>(previous, inner.name())?, next) {
                    return Ok(node.clone());
                }
            }
            let node: VNode = VComponent::with_props(&inner, Rc::clone(props)).into();
            *last = Some((Rc::clone(props), node.clone()));
            Ok(node)
        });
        Ok(Rendered::Render(render))
    })
}
