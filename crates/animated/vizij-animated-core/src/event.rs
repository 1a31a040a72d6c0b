//! Routing of host events onto root values.
//!
//! A handler is built from one optional mapping per positional argument. Each
//! mapping mirrors the shape of its argument: objects map keys to nested
//! mappings, arrays are indexed by decimal keys (`"0"`, `"1"`, ...) and numbers
//! land on [`AnimatedValue`]s via `set_value`.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use log::trace;
use serde_json::Value as Json;

use crate::error::{AnimatedError, Result};
use crate::graph::AnimatedValue;

/// Mapping tree for one event argument.
#[derive(Clone, Debug)]
pub enum EventMapping {
    Value(AnimatedValue),
    Object(IndexMap<String, EventMapping>),
}

impl EventMapping {
    /// Object mapping from `(key, mapping)` pairs.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, EventMapping)>) -> Self {
        EventMapping::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<&AnimatedValue> for EventMapping {
    fn from(value: &AnimatedValue) -> Self {
        EventMapping::Value(value.clone())
    }
}

pub type EventListener = Rc<dyn Fn(&[Json])>;

/// Callable produced by [`event`].
#[derive(Clone)]
pub struct EventHandler {
    mappings: Vec<Option<EventMapping>>,
    listener: Option<EventListener>,
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("mappings", &self.mappings)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Build a handler routing positional event arguments through `mappings`.
pub fn event(mappings: Vec<Option<EventMapping>>, listener: Option<EventListener>) -> EventHandler {
    EventHandler { mappings, listener }
}

impl EventHandler {
    /// Walk every argument alongside its mapping, then call the listener with
    /// the raw arguments. Values set before a shape error stay set.
    pub fn handle(&self, args: &[Json]) -> Result<()> {
        for (idx, mapping) in self.mappings.iter().enumerate() {
            let Some(mapping) = mapping else { continue };
            let arg = args.get(idx).unwrap_or(&Json::Null);
            traverse(mapping, arg, &format!("arg{idx}"))?;
        }
        if let Some(listener) = &self.listener {
            listener(args);
        }
        Ok(())
    }
}

fn traverse(mapping: &EventMapping, event: &Json, key: &str) -> Result<()> {
    if let Some(number) = event.as_f64() {
        return match mapping {
            EventMapping::Value(value) => {
                trace!("event {key} -> {number}");
                value.set_value(number);
                Ok(())
            }
            EventMapping::Object(_) => {
                Err(mismatch(key, "event value must map to an animated value"))
            }
        };
    }
    let EventMapping::Object(children) = mapping else {
        let reason = format!("expected a number, got {}", kind_of(event));
        return Err(mismatch(key, &reason));
    };
    if !matches!(event, Json::Object(_) | Json::Array(_)) {
        let reason = format!("bad event of type {}", kind_of(event));
        return Err(mismatch(key, &reason));
    }
    for (child_key, child) in children {
        let nested = field(event, child_key).unwrap_or(&Json::Null);
        traverse(child, nested, child_key)?;
    }
    Ok(())
}

/// Object fields by name; array elements by decimal index.
fn field<'a>(event: &'a Json, key: &str) -> Option<&'a Json> {
    match event {
        Json::Object(fields) => fields.get(key),
        Json::Array(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    }
}

fn mismatch(key: &str, reason: &str) -> AnimatedError {
    AnimatedError::EventMapping {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn kind_of(event: &Json) -> &'static str {
    match event {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_at_object_mapping_is_rejected() {
        let x = AnimatedValue::new(0.0);
        let handler = event(
            vec![Some(EventMapping::object([("x", EventMapping::from(&x))]))],
            None,
        );
        let err = handler.handle(&[json!(5)]).unwrap_err();
        assert!(matches!(err, AnimatedError::EventMapping { ref key, .. } if key == "arg0"));
    }

    #[test]
    fn missing_field_reports_its_key() {
        let x = AnimatedValue::new(0.0);
        let handler = event(
            vec![Some(EventMapping::object([("x", EventMapping::from(&x))]))],
            None,
        );
        let err = handler.handle(&[json!({ "y": 1 })]).unwrap_err();
        assert!(matches!(err, AnimatedError::EventMapping { ref key, .. } if key == "x"));
    }
}
