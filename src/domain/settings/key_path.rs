// Dotted key paths ("app.autostart") over a JSON settings document.

use serde_json::{Map, Value};

use crate::domain::{DomainError, DomainResult};

/// Value at `path`, or `None` when any segment is missing.
pub fn get_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |node, segment| node.as_object()?.get(segment))
}

/// Write `value` at `path`, creating intermediate objects. A non-object
/// intermediate is replaced by an object.
pub fn set_path(document: &mut Value, path: &str, value: Value) -> DomainResult<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(DomainError::InvariantViolation(format!(
            "invalid settings key path: {:?}",
            path
        )));
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| DomainError::InvariantViolation("empty settings key path".to_string()))?;

    let mut node = document;
    for segment in parents {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert(last.to_string(), value);
    Ok(())
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by an object"),
    }
}

/// Deep-merge `persisted` over `defaults`. Missing keys fall back to the
/// default; keys the defaults do not know are kept as-is.
pub fn merge_over_defaults(defaults: Value, persisted: Value) -> Value {
    match (defaults, persisted) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(default) => merge_over_defaults(default, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, persisted) => persisted,
    }
}
