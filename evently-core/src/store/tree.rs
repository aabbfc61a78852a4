//! In-memory JSON tree operations shared by the local store implementations.

use serde_json::{Map, Value};

use crate::path::StorePath;

pub fn get<'a>(tree: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut node = tree;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    if is_empty(node) { None } else { Some(node) }
}

/// Write `value` at `path`. `None` (or a value that normalizes to nothing) deletes
/// the node and prunes parents left empty by the deletion.
pub fn set(tree: &mut Value, path: &StorePath, value: Option<Value>) {
    let value = value.and_then(normalize);

    let Some((last, parents)) = path.segments().split_last() else {
        *tree = value.unwrap_or_else(|| Value::Object(Map::new()));
        return;
    };

    match value {
        Some(value) => {
            let mut node = tree;
            for segment in parents {
                node = ensure_object(node)
                    .entry(segment.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
            }
            ensure_object(node).insert(last.clone(), value);
        }
        None => {
            remove(tree, path.segments());
        }
    }
}

/// Drop nulls and empty objects recursively, `None` if nothing remains.
pub fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k, v)))
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::Object(cleaned))
            }
        }
        other => Some(other),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// Remove the node at `segments`; returns true when the caller's node became empty.
fn remove(node: &mut Value, segments: &[String]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return true;
    };
    let Some(map) = node.as_object_mut() else {
        return false;
    };
    let child_emptied = match map.get_mut(first) {
        Some(child) if rest.is_empty() => {
            *child = Value::Null;
            true
        }
        Some(child) => remove(child, rest),
        None => false,
    };
    if child_emptied {
        map.remove(first);
    }
    map.is_empty()
}
