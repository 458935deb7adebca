//! Property Binder
//!
//! Translates one property change on a virtual element into concrete
//! mutations on its host node.

use crate::error::Result;
use crate::scheduler::Effect;
use crate::vdom::PropValue;

use super::{Document, HostNode};

/// Sink for callbacks that must run after the current render pass.
pub trait EffectQueue {
    fn enqueue_effect(&self, effect: Effect);
}

/// Apply a single property transition from `old` to `new` on `node`.
///
/// - identical values do nothing
/// - `key` and `children` are reserved and never reach the host
/// - `ref` calls the old callback with `None` and queues the new one with
///   the node as a deferred effect
/// - handler values attach and detach listeners; the event name is the key
///   without its `on` prefix and `capture` suffix, lower-cased; a switch
///   between a handler and a plain value also writes or clears the plain one
/// - anything else becomes a direct field when the node exposes one (and
///   is not under a foreign namespace such as SVG), an attribute otherwise
pub fn apply_property(
    doc: &Document,
    node: HostNode,
    key: &str,
    old: Option<&PropValue>,
    new: Option<&PropValue>,
    svg: bool,
    effects: &dyn EffectQueue,
) -> Result<()> {
    match (old, new) {
        (None, None) => return Ok(()),
        (Some(a), Some(b)) if a.is_same(b) => return Ok(()),
        _ => {}
    }

    match key {
        "key" | "children" => Ok(()),
        "ref" => {
            if let Some(PropValue::Ref(previous)) = old {
                previous.call(None);
            }
            if let Some(PropValue::Ref(next)) = new {
                let next = next.clone();
                effects.enqueue_effect(Box::new(move || next.call(Some(node))));
            }
            Ok(())
        }
        _ if is_handler(old) || is_handler(new) => {
            let (event, capture) = event_name(key);
            if let Some(PropValue::Handler(previous)) = old {
                doc.remove_listener(node, &event, capture, previous)?;
            }
            match new {
                Some(PropValue::Handler(next)) => {
                    doc.add_listener(node, &event, capture, next.clone())?;
                    if old.is_some() && !is_handler(old) {
                        write_value(doc, node, key, None, svg)?;
                    }
                    Ok(())
                }
                Some(value) => write_value(doc, node, key, Some(value), svg),
                None => Ok(()),
            }
        }
        _ => write_value(doc, node, key, new, svg),
    }
}

/// Write a plain value as a field or attribute; `None` clears it.
fn write_value(
    doc: &Document,
    node: HostNode,
    key: &str,
    value: Option<&PropValue>,
    svg: bool,
) -> Result<()> {
    if !svg && doc.has_field(node, key) {
        return doc.set_field(node, key, value.cloned().unwrap_or(PropValue::Null));
    }
    match value.and_then(PropValue::to_attribute) {
        Some(value) => doc.set_attribute(node, key, &value),
        None => doc.remove_attribute(node, key),
    }
}

fn is_handler(value: Option<&PropValue>) -> bool {
    matches!(value, Some(PropValue::Handler(_)))
}

/// Split a handler key such as `onClickCapture` into `("click", true)`.
fn event_name(key: &str) -> (String, bool) {
    let lower = key.to_ascii_lowercase();
    let name = lower.strip_prefix("on").unwrap_or(&lower);
    match name.strip_suffix("capture") {
        Some(stripped) if !stripped.is_empty() => (stripped.to_string(), true),
        _ => (name.to_string(), false),
    }
}
