//! The shared in-memory value model
//!
//! All formats convert to and from [`ValueTree`], which is
//! `serde_json::Value` built with ordered maps: scalars (string, number,
//! boolean, null), sequences (`Array`) and maps (`Object`) with unique keys.

use serde_json::{Map, Value};

use crate::path::KeyPath;

/// The value tree every format adapter produces and consumes.
pub type ValueTree = Value;

/// A fresh empty map.
pub fn empty_map() -> Value {
    Value::Object(Map::new())
}

/// Whether the value is neither a sequence nor a map.
pub fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

pub fn is_empty_map(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

/// Text form of a scalar as it would appear in an untyped format.
///
/// Returns `None` for sequences and maps.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Follow `path` through nested maps.
pub fn lookup<'a>(tree: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(tree, |node, key| node.as_object()?.get(key))
}

/// Store `value` at `path`, creating intermediate maps.
///
/// Intermediate nodes that are not maps are replaced by maps.
pub fn insert_at(tree: &mut Value, path: &KeyPath, value: Value) {
    let Some((last, parents)) = path.segments().split_last() else {
        *tree = value;
        return;
    };

    let mut node = tree;
    for key in parents {
        if !node.is_object() {
            *node = empty_map();
        }
        let Some(map) = node.as_object_mut() else {
            return;
        };
        node = map.entry(key.clone()).or_insert_with(empty_map);
    }

    if !node.is_object() {
        *node = empty_map();
    }
    if let Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
}

/// Collect every value reachable at `segments` below `value`.
///
/// Sequences met along the way (or at the end) are expanded, so a record
/// like `{hooks: [{id: a}, {id: b}]}` yields both `a` and `b` for the path
/// `hooks.id`.
pub fn collect_at<'a>(value: &'a Value, segments: &[String], out: &mut Vec<&'a Value>) {
    match (value, segments.split_first()) {
        (Value::Array(items), _) => {
            for item in items {
                collect_at(item, segments, out);
            }
        }
        (_, None) => out.push(value),
        (Value::Object(map), Some((key, rest))) => {
            if let Some(child) = map.get(key) {
                collect_at(child, rest, out);
            }
        }
        _ => {}
    }
}

/// Deep-merge `overlay` into `base`. Maps merge key by key; anything else
/// in `overlay` replaces what `base` holds.
pub fn merge_into(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Apply `delta` onto `live` in place, mirroring the delta's shape.
///
/// Map keys present in `live` are recursed into and absent ones inserted.
/// Sequences are patched element-wise: scalar elements are replaced,
/// composite elements recursed into, and extra desired elements appended.
pub fn patch_value(live: &mut Value, delta: &Value) {
    match (live, delta) {
        (Value::Object(live_map), Value::Object(delta_map)) => {
            for (key, want) in delta_map {
                match live_map.get_mut(key) {
                    Some(existing) => patch_value(existing, want),
                    None => {
                        live_map.insert(key.clone(), want.clone());
                    }
                }
            }
        }
        (Value::Array(live_items), Value::Array(delta_items)) => {
            for (index, want) in delta_items.iter().enumerate() {
                match live_items.get_mut(index) {
                    Some(existing) if is_scalar(existing) => *existing = want.clone(),
                    Some(existing) => patch_value(existing, want),
                    None => live_items.push(want.clone()),
                }
            }
        }
        (live, delta) => *live = delta.clone(),
    }
}
