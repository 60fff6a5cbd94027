//! Flat and nested locale shapes and the conversions between them.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::error::{Collision, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// `{ "home.title": "..." }`
    Flat,
    /// `{ "home": { "title": "..." } }`
    Nested,
}

/// Detect the on-disk shape of a locale document.
///
/// A document with nested objects is nested; one whose top-level keys contain
/// the delimiter is flat. Anything else (empty, or single-segment keys only)
/// fits both and returns `None`.
pub fn detect_shape(value: &Map<String, Value>, delimiter: &str) -> Option<Shape> {
    if value.values().any(Value::is_object) {
        Some(Shape::Nested)
    } else if value.keys().any(|k| k.contains(delimiter)) {
        Some(Shape::Flat)
    } else {
        None
    }
}

/// Flatten a nested document into delimiter-joined keys, keeping document order.
///
/// Non-object leaves (strings, arrays, numbers) are kept as they are. Empty
/// objects have no leaves and disappear.
pub fn flatten(value: &Map<String, Value>, delimiter: &str) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(value, None, delimiter, &mut out);
    out
}

fn flatten_into(
    value: &Map<String, Value>,
    prefix: Option<&str>,
    delimiter: &str,
    out: &mut Map<String, Value>,
) {
    for (key, child) in value {
        let full_key = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, delimiter, key),
            None => key.clone(),
        };
        match child {
            Value::Object(map) => flatten_into(map, Some(&full_key), delimiter, out),
            leaf => {
                out.insert(full_key, leaf.clone());
            }
        }
    }
}

/// Rebuild a nested document from flat entries.
///
/// Fails with `ShapeConflict` when one key is both a leaf and a parent.
pub fn unflatten(entries: &Map<String, Value>, delimiter: &str) -> Result<Map<String, Value>, StoreError> {
    let mut root = Map::new();
    for (key, value) in entries {
        let segments: Vec<&str> = key.split(delimiter).collect();
        let Some((last, parents)) = segments.split_last() else {
            continue;
        };

        let mut node = &mut root;
        for (depth, segment) in parents.iter().enumerate() {
            node = match node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                Value::Object(map) => map,
                _ => {
                    return Err(StoreError::ShapeConflict {
                        key: key.clone(),
                        conflict: segments[..=depth].join(delimiter),
                        delimiter: delimiter.to_string(),
                    });
                }
            };
        }
        if node.get(*last).is_some_and(Value::is_object) {
            return Err(StoreError::ShapeConflict {
                key: key.clone(),
                conflict: format!("{}{}…", key, delimiter),
                delimiter: delimiter.to_string(),
            });
        }
        node.insert(last.to_string(), value.clone());
    }
    Ok(root)
}

/// Sort object keys recursively.
pub fn sort_recursive(map: &mut Map<String, Value>) {
    map.sort_keys();
    for value in map.values_mut() {
        if let Value::Object(child) = value {
            sort_recursive(child);
        }
    }
}

/// Check `key` against an existing set of flat keys for hierarchy clashes.
///
/// An identical key is not a collision.
pub fn hierarchy_collision<'a, I>(keys: I, key: &str, delimiter: &str) -> Option<Collision>
where
    I: IntoIterator<Item = &'a String>,
{
    let child_prefix = format!("{}{}", key, delimiter);
    let mut child_is_parent = false;
    for existing in keys {
        if existing == key {
            continue;
        }
        if key.starts_with(existing.as_str()) && key[existing.len()..].starts_with(delimiter) {
            return Some(Collision::ParentIsLeaf);
        }
        if existing.starts_with(&child_prefix) {
            child_is_parent = true;
        }
    }
    child_is_parent.then_some(Collision::ChildIsParent)
}
