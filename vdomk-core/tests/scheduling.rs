//! Integration Tests for Update Scheduling
//!
//! These tests verify flush ordering, effect draining, cleanup order and
//! update propagation through context and memo.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vdomk_core::component::{memo, Component, Context, Instance};
use vdomk_core::host::{Document, HostNode};
use vdomk_core::scheduler::{LocalEventLoop, Scheduler, TokioEventLoop};
use vdomk_core::vdom::{VArray, VComponent, VElement, VNode};
use vdomk_core::{create_root, Error, Result};

type Log = Rc<RefCell<Vec<String>>>;
type Slot = Rc<RefCell<Option<Instance>>>;

struct Harness {
    event_loop: Rc<LocalEventLoop>,
    scheduler: Scheduler,
    doc: Document,
    body: HostNode,
}

fn harness() -> Harness {
    let event_loop = Rc::new(LocalEventLoop::new());
    let scheduler = Scheduler::new(event_loop.clone());
    let doc = Document::new();
    let body = doc.create_element("body", None);
    Harness {
        event_loop,
        scheduler,
        doc,
        body,
    }
}

fn push(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// A component that logs each render and exposes its instance, rendering
/// `child` underneath a label.
fn tracked(name: &'static str, log: &Log, slot: &Slot, child: VNode) -> Component {
    let log = log.clone();
    let slot = slot.clone();
    Component::with_setup(name, move |_: &(), instance: &Instance| {
        *slot.borrow_mut() = Some(instance.clone());
        let log = log.clone();
        let child = child.clone();
        Ok(move |_: &(), _: &Instance| -> Result<VNode> {
            push(&log, name);
            Ok(VArray::new([VNode::text(name), child.clone()]).into())
        })
    })
}

fn schedule(slot: &Slot) {
    slot.borrow().as_ref().expect("component mounted").schedule_update();
}

/// Parents update before their children, whatever order they asked in.
#[test]
fn flush_runs_shallow_layers_first() {
    let h = harness();
    let log = Log::default();
    let (parent_slot, child_slot) = (Slot::default(), Slot::default());

    let child = tracked("child", &log, &child_slot, VNode::Nothing);
    let parent = tracked("parent", &log, &parent_slot, VComponent::new(&child, ()).into());

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(VComponent::new(&parent, ())).unwrap();
    assert_eq!(entries(&log), ["parent", "child"]);
    log.borrow_mut().clear();

    schedule(&child_slot);
    schedule(&parent_slot);
    h.event_loop.run_until_idle().unwrap();
    assert_eq!(entries(&log), ["parent", "child"]);
    assert_eq!(h.doc.text_content(h.body), "parentchild");
}

/// A child removed by its parent's update never runs its own queued update.
#[test]
fn removed_children_skip_their_queued_update() {
    let h = harness();
    let log = Log::default();
    let show = Rc::new(Cell::new(true));
    let (parent_slot, child_slot) = (Slot::default(), Slot::default());

    let child = tracked("child", &log, &child_slot, VNode::Nothing);
    let child_node: VNode = VComponent::new(&child, ()).into();
    let parent = {
        let (log, show, slot) = (log.clone(), show.clone(), parent_slot.clone());
        Component::new("parent", move |_: &(), instance: &Instance| {
            *slot.borrow_mut() = Some(instance.clone());
            push(&log, "parent");
            Ok(if show.get() { child_node.clone() } else { VNode::Nothing })
        })
    };

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(VComponent::new(&parent, ())).unwrap();
    log.borrow_mut().clear();

    show.set(false);
    schedule(&child_slot);
    schedule(&parent_slot);
    h.event_loop.run_until_idle().unwrap();

    assert_eq!(entries(&log), ["parent"]);
    let child_instance = child_slot.borrow().clone().unwrap();
    assert!(!child_instance.is_alive());
    assert_eq!(h.doc.text_content(h.body), "");
}

/// Effects run deepest first, and effects queued by effects run in a later
/// pass of the same flush.
#[test]
fn effects_drain_deepest_first() {
    let h = harness();
    let log = Log::default();

    let leaf = {
        let log = log.clone();
        Component::new("leaf", move |_: &(), instance: &Instance| {
            let log = log.clone();
            let nested = instance.clone();
            instance.effect(move || {
                push(&log, "leaf");
                let log = log.clone();
                nested.effect(move || push(&log, "leaf again"));
            });
            Ok(VNode::Nothing)
        })
    };
    let level = |name: &'static str, inner: &Component| {
        let log = log.clone();
        let inner: VNode = VComponent::new(inner, ()).into();
        Component::new(name, move |_: &(), instance: &Instance| {
            let log = log.clone();
            instance.effect(move || push(&log, name));
            Ok(inner.clone())
        })
    };
    let middle = level("middle", &leaf);
    let top = level("top", &middle);

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(VComponent::new(&top, ())).unwrap();
    assert_eq!(entries(&log), ["leaf", "middle", "top", "leaf again"]);
}

/// Cleanups registered as C1 then C2 run as C2 then C1.
#[test]
fn cleanups_run_in_reverse_registration_order() {
    let h = harness();
    let log = Log::default();
    let component = {
        let log = log.clone();
        Component::with_setup("cleanups", move |_: &(), instance: &Instance| {
            for name in ["C1", "C2"] {
                let log = log.clone();
                instance.cleanup(move || push(&log, name));
            }
            Ok(|_: &(), _: &Instance| -> Result<VNode> { Ok(VNode::text("mounted")) })
        })
    };

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(VElement::new("div").child(VComponent::new(&component, ()))).unwrap();
    root.render(VElement::new("div")).unwrap();
    assert_eq!(entries(&log), ["C2", "C1"]);

    root.render(VComponent::new(&component, ())).unwrap();
    root.unmount();
    assert_eq!(entries(&log), ["C2", "C1", "C2", "C1"]);
}

/// A burst of requests right after a flush coalesces on a microtask; once a
/// macrotask has passed, the next request waits for a macrotask.
#[test]
fn deferral_switches_from_microtask_to_macrotask() {
    let h = harness();
    let log = Log::default();
    let (a_slot, b_slot) = (Slot::default(), Slot::default());
    let a = tracked("a", &log, &a_slot, VNode::Nothing);
    let b = tracked("b", &log, &b_slot, VNode::Nothing);

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(vec![VComponent::new(&a, ()).into(), VComponent::new(&b, ()).into()]).unwrap();
    log.borrow_mut().clear();

    schedule(&a_slot);
    schedule(&b_slot);
    assert_eq!(h.event_loop.pending_microtasks(), 2);
    h.event_loop.run_microtasks().unwrap();
    assert_eq!(entries(&log), ["a", "b"]);

    h.event_loop.run_until_idle().unwrap();
    schedule(&a_slot);
    assert_eq!(h.event_loop.pending_microtasks(), 0);
    assert_eq!(h.event_loop.pending_tasks(), 1);
    h.event_loop.run_until_idle().unwrap();
    assert_eq!(entries(&log), ["a", "b", "a"]);
}

/// Only subscribers whose selected value changed are scheduled.
#[test]
fn context_selectors_filter_updates() {
    let h = harness();
    let context = Context::new((0, 0));
    let renders = Rc::new(RefCell::new([0, 0]));

    let consumer = |index: usize| {
        let (context, renders) = (context.clone(), renders.clone());
        Component::with_setup("consumer", move |_: &(), instance: &Instance| {
            let selected = context.select(
                instance,
                move |pair: &(i32, i32)| if index == 0 { pair.0 } else { pair.1 },
                |a: &i32, b: &i32| a == b,
            );
            let renders = renders.clone();
            Ok(move |_: &(), _: &Instance| -> Result<VNode> {
                renders.borrow_mut()[index] += 1;
                Ok(VNode::from(selected.get()))
            })
        })
    };
    let children: VNode = vec![
        VComponent::new(&consumer(0), ()).into(),
        VComponent::new(&consumer(1), ()).into(),
    ]
    .into();

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(context.provider((0, 0), children.clone())).unwrap();
    assert_eq!(*renders.borrow(), [1, 1]);

    root.render(context.provider((5, 0), children.clone())).unwrap();
    h.event_loop.run_until_idle().unwrap();
    assert_eq!(*renders.borrow(), [2, 1]);
    assert_eq!(h.doc.text_content(h.body), "50");

    root.render(context.provider((5, 0), children)).unwrap();
    h.event_loop.run_until_idle().unwrap();
    assert_eq!(*renders.borrow(), [2, 1]);
}

/// Plain subscribers re-render on every change; unmounting unsubscribes.
#[test]
fn context_subscribers_follow_the_nearest_provider() {
    let h = harness();
    let theme = Context::new("light");
    let seen = Log::default();
    let label = {
        let (theme, seen) = (theme.clone(), seen.clone());
        Component::with_setup("label", move |_: &(), instance: &Instance| {
            let current = theme.subscribe(instance);
            let seen = seen.clone();
            Ok(move |_: &(), _: &Instance| -> Result<VNode> {
                push(&seen, current.get());
                Ok(VNode::text(current.get()))
            })
        })
    };
    let labels: VNode = vec![
        VComponent::new(&label, ()).into(),
        theme.provider("nested", VComponent::new(&label, ())),
    ]
    .into();

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(VComponent::new(&label, ())).unwrap();
    assert_eq!(h.doc.text_content(h.body), "light");

    root.render(theme.provider("dark", labels.clone())).unwrap();
    assert_eq!(h.doc.text_content(h.body), "darknested");

    seen.borrow_mut().clear();
    root.render(theme.provider("dim", labels)).unwrap();
    h.event_loop.run_until_idle().unwrap();
    assert_eq!(entries(&seen), ["dim"]);
    assert_eq!(h.doc.text_content(h.body), "dimnested");
}

#[derive(PartialEq)]
struct Label(&'static str);

/// Memoized components skip re-rendering while props stay equal.
#[test]
fn memo_skips_equal_props() {
    let h = harness();
    let renders = Rc::new(Cell::new(0));
    let inner = {
        let renders = renders.clone();
        Component::new("label", move |label: &Label, _: &Instance| {
            renders.set(renders.get() + 1);
            Ok(VNode::text(label.0))
        })
    };
    let memoized = memo::<Label>(&inner);

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(VComponent::new(&memoized, Label("a"))).unwrap();
    root.render(VComponent::new(&memoized, Label("a"))).unwrap();
    assert_eq!(renders.get(), 1);

    root.render(VComponent::new(&memoized, Label("b"))).unwrap();
    assert_eq!(renders.get(), 2);
    assert_eq!(h.doc.text_content(h.body), "b");
}

/// Render errors surface from whatever ran the flush.
#[test]
fn render_errors_reach_the_caller() {
    let h = harness();
    let fail = Rc::new(Cell::new(false));
    let slot = Slot::default();
    let flaky = {
        let (fail, slot) = (fail.clone(), slot.clone());
        Component::new("flaky", move |_: &(), instance: &Instance| {
            *slot.borrow_mut() = Some(instance.clone());
            if fail.get() {
                return Err(Error::render("flaky component failed"));
            }
            Ok(VNode::text("ok"))
        })
    };

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(VComponent::new(&flaky, ())).unwrap();

    fail.set(true);
    schedule(&slot);
    let err = h.event_loop.run_until_idle().unwrap_err();
    assert!(matches!(err, Error::Render(_)));
    assert!(!h.scheduler.is_flushing());

    let direct = root.render(VComponent::new(&flaky, ())).unwrap_err();
    assert_eq!(direct.to_string(), "component render failed: flaky component failed");
}

fn keeper(log: &Log) -> Component {
    let log = log.clone();
    Component::with_setup("keeper", move |_: &(), instance: &Instance| {
        let log = log.clone();
        instance.cleanup(move || push(&log, "keeper cleanup"));
        Ok(|_: &(), _: &Instance| -> Result<VNode> { Ok(VNode::text("K")) })
    })
}

fn flaky(fail: &Rc<Cell<bool>>) -> Component {
    let fail = fail.clone();
    Component::new("flaky", move |_: &(), _: &Instance| {
        if fail.get() {
            return Err(Error::render("flaky component failed"));
        }
        Ok(VNode::text("F"))
    })
}

/// A sibling failing mid-list leaves the rest of the list reachable, so
/// unmounting still runs every cleanup and empties the container.
#[test]
fn failed_list_update_still_unmounts_cleanly() {
    let h = harness();
    let log = Log::default();
    let fail = Rc::new(Cell::new(false));
    let (keeper, flaky) = (keeper(&log), flaky(&fail));
    let list = || vec![VNode::from(VComponent::new(&keeper, ())), VComponent::new(&flaky, ()).into()];

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(list()).unwrap();
    assert_eq!(h.doc.text_content(h.body), "KF");

    fail.set(true);
    assert!(root.render(list()).is_err());
    assert_eq!(h.doc.text_content(h.body), "KF");

    root.unmount();
    assert_eq!(entries(&log), ["keeper cleanup"]);
    assert!(h.doc.children(h.body).is_empty());
}

/// Same as above when the failure happens while a keyed node is moved.
#[test]
fn failed_keyed_move_still_unmounts_cleanly() {
    let h = harness();
    let log = Log::default();
    let fail = Rc::new(Cell::new(false));
    let (keeper, flaky) = (keeper(&log), flaky(&fail));
    let list = |order: [&'static str; 2]| -> VNode {
        let items: Vec<VNode> = order
            .into_iter()
            .map(|key| match key {
                "keeper" => VComponent::new(&keeper, ()).key(key).into(),
                _ => VComponent::new(&flaky, ()).key(key).into(),
            })
            .collect();
        items.into()
    };

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(list(["keeper", "flaky"])).unwrap();

    fail.set(true);
    assert!(root.render(list(["flaky", "keeper"])).is_err());
    assert_eq!(h.doc.text_content(h.body), "FK");

    fail.set(false);
    root.render(list(["keeper", "flaky"])).unwrap();
    assert_eq!(h.doc.text_content(h.body), "KF");

    root.unmount();
    assert_eq!(entries(&log), ["keeper cleanup"]);
    assert!(h.doc.children(h.body).is_empty());
}

/// Refs collected before a failing layer in the same flush still fire.
#[test]
fn refs_fire_when_a_later_layer_fails() {
    let h = harness();
    let fail = Rc::new(Cell::new(false));
    let reveal = Rc::new(Cell::new(false));
    let attached = Rc::new(RefCell::new(Vec::new()));
    let (field_slot, flaky_slot) = (Slot::default(), Slot::default());

    let field = {
        let (reveal, attached, slot) = (reveal.clone(), attached.clone(), field_slot.clone());
        Component::new("field", move |_: &(), instance: &Instance| {
            *slot.borrow_mut() = Some(instance.clone());
            if !reveal.get() {
                return Ok(VNode::Nothing);
            }
            let attached = attached.clone();
            Ok(VElement::new("input")
                .node_ref(move |node| attached.borrow_mut().push(node))
                .into())
        })
    };
    let broken = {
        let (fail, slot) = (fail.clone(), flaky_slot.clone());
        Component::new("broken", move |_: &(), instance: &Instance| {
            *slot.borrow_mut() = Some(instance.clone());
            if fail.get() {
                return Err(Error::render("broken component failed"));
            }
            Ok(VNode::Nothing)
        })
    };

    let root = create_root(&h.doc, &h.scheduler, h.body, None).unwrap();
    root.render(vec![VNode::from(VComponent::new(&field, ())), VComponent::new(&broken, ()).into()])
        .unwrap();

    reveal.set(true);
    fail.set(true);
    schedule(&field_slot);
    schedule(&flaky_slot);
    assert!(h.event_loop.run_until_idle().is_err());

    let attached = attached.borrow();
    assert_eq!(attached.len(), 1);
    let input = attached[0].expect("ref received the node");
    assert_eq!(h.doc.parent(input), Some(h.body));
}

/// Scheduled updates run on a tokio local set.
#[tokio::test(flavor = "current_thread")]
async fn tokio_event_loop_flushes_scheduled_updates() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let scheduler = Scheduler::new(Rc::new(TokioEventLoop::new()));
            let doc = Document::new();
            let body = doc.create_element("body", None);
            let count = Rc::new(Cell::new(0));
            let slot = Slot::default();

            let counter = {
                let (count, slot) = (count.clone(), slot.clone());
                Component::new("counter", move |_: &(), instance: &Instance| {
                    *slot.borrow_mut() = Some(instance.clone());
                    Ok(VNode::from(count.get()))
                })
            };
            let root = create_root(&doc, &scheduler, body, None).unwrap();
            root.render(VComponent::new(&counter, ())).unwrap();
            assert_eq!(doc.text_content(body), "0");

            count.set(3);
            schedule(&slot);
            assert_eq!(doc.text_content(body), "0");
            for _ in 0..8 {
                tokio::task::yield_now().await;
            }
            assert_eq!(doc.text_content(body), "3");
        })
        .await;
}
