//! Component functions and their two forms.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::vdom::VNode;

use super::{Instance, Props};

/// The function a layer calls on every pass after the first.
pub type RenderFn = Rc<dyn Fn(&Props, &Instance) -> Result<VNode>>;

/// What a component function produced.
pub enum Rendered {
    /// Rendered content; the component is one-phase.
    Node(VNode),
    /// A render function; the component is two-phase and this function
    /// replaces it for every later pass.
    Render(RenderFn),
}

type ComponentFn = dyn Fn(&Props, &Instance) -> Result<Rendered>;

/// A component function together with a name used in errors and logs.
///
/// Two [`Component`] values are the same component when they are clones of
/// one another; building two components from the same closure code yields
/// different components.
#[derive(Clone)]
pub struct Component {
    name: &'static str,
    function: Rc<ComponentFn>,
}

impl Component {
    /// A one-phase component: `render` runs on every pass.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vdomk_core::component::Component;
    /// use vdomk_core::vdom::{VElement, VNode};
    ///
    /// struct Greeting {
    ///     name: String,
    /// }
    ///
    /// let greeting = Component::new("greeting", |props: &Greeting, _| {
    ///     Ok(VElement::new("p").child(format!("Hello {}", props.name)).into())
    /// });
    /// assert_eq!(greeting.name(), "greeting");
    /// ```
    pub fn new<P, F>(name: &'static str, render: F) -> Self
    where
        P: Any,
        F: Fn(&P, &Instance) -> Result<VNode> + 'static,
    {
        Self::from_fn(name, move |props, instance| {
            let props = downcast_props::<P>(props, name)?;
            render(props, instance).map(Rendered::Node)
        })
    }

    /// A two-phase component: `setup` runs once on mount and returns the
    /// render function for every pass, including the first.
    pub fn with_setup<P, S, R>(name: &'static str, setup: S) -> Self
    where
        P: Any,
        S: Fn(&P, &Instance) -> Result<R> + 'static,
        R: Fn(&P, &Instance) -> Result<VNode> + 'static,
    {
        Self::from_fn(name, move |props, instance| {
            let render = setup(downcast_props::<P>(props, name)?, instance)?;
            let render: RenderFn = Rc::new(move |props: &Props, instance: &Instance| {
                render(downcast_props::<P>(props, name)?, instance)
            });
            Ok(Rendered::Render(render))
        })
    }

    /// A component over type-erased props that picks its form at run time.
    pub fn from_fn<F>(name: &'static str, function: F) -> Self
    where
        F: Fn(&Props, &Instance) -> Result<Rendered> + 'static,
    {
        Self {
            name,
            function: Rc::new(function),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True when both values are clones of the same component.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.function), Rc::as_ptr(&other.function))
    }

    pub(crate) fn invoke(&self, props: &Props, instance: &Instance) -> Result<Rendered> {
        (self.function)(props, instance)
    }

    /// Call the component once and settle on the function used for every
    /// later pass. Returns that function and the first rendered content.
    pub(crate) fn resolve(&self, props: &Props, instance: &Instance) -> Result<(RenderFn, VNode)> {
        match self.invoke(props, instance)? {
            Rendered::Node(first) => {
                let component = self.clone();
                let render: RenderFn = Rc::new(move |props: &Props, instance: &Instance| {
                    match component.invoke(props, instance)? {
                        Rendered::Node(node) => Ok(node),
                        Rendered::Render(_) => Err(Error::render(format!(
                            "component `{}` returned a render function after its first pass",
                            component.name
                        ))),
                    }
                });
                Ok((render, first))
            }
            Rendered::Render(render) => {
                let first = render(props, instance)?;
                Ok((render, first))
            }
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

/// Borrow type-erased props as `P`.
pub(crate) fn downcast_props<'a, P: Any>(props: &'a Props, component: &'static str) -> Result<&'a P> {
    (**props).downcast_ref::<P>().ok_or(Error::PropsType {
        component,
        expected: std::any::type_name::<P>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn detached() -> Instance {
        Instance::detached()
    }

    #[test]
    fn one_phase_components_resolve_to_themselves() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let component = Component::new("echo", move |props: &String, _| {
            counter.set(counter.get() + 1);
            Ok(VNode::text(props.as_str()))
        });

        let props: Props = Rc::new(String::from("hi"));
        let (render, first) = component.resolve(&props, &detached()).unwrap();
        assert!(first.is_same(&VNode::from("hi")));
        render(&props, &detached()).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn two_phase_components_set_up_once() {
        let setups = Rc::new(Cell::new(0));
        let counter = setups.clone();
        let component = Component::with_setup("counter", move |_: &(), _: &Instance| {
            counter.set(counter.get() + 1);
            let renders = Cell::new(0);
            Ok(move |_: &(), _: &Instance| -> Result<VNode> {
                renders.set(renders.get() + 1);
                Ok(VNode::from(renders.get()))
            })
        });

        let props: Props = Rc::new(());
        let (render, first) = component.resolve(&props, &detached()).unwrap();
        assert!(first.is_same(&VNode::from(1)));
        assert!(render(&props, &detached()).unwrap().is_same(&VNode::from(2)));
        assert_eq!(setups.get(), 1);
    }

    #[test]
    fn wrong_props_type_is_reported() {
        let component = Component::new("typed", |_: &u32, _| Ok(VNode::Nothing));
        let props: Props = Rc::new("not a number");
        let err = component.resolve(&props, &detached()).err().unwrap();
        assert!(matches!(err, Error::PropsType { component: "typed", .. }));
    }

    #[test]
    fn identity_follows_clones() {
        let a = Component::new("a", |_: &(), _| Ok(VNode::Nothing));
        let b = Component::new("a", |_: &(), _| Ok(VNode::Nothing));
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }
}
