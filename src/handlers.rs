//! Stock merge handlers and export hooks.
//!
//! Merge semantics:
//! - `replace`: incoming wins
//! - `append`: arrays replace, scalars are pushed
//! - `extend_or_push`: arrays extend, scalars are pushed
//! - `merge_object`: shallow key update
//! - `merge_deep`: recursive object merge (arrays and scalars replace)
//!
//! Every handler returns `current` unchanged when `incoming` has a shape
//! it cannot use.

use serde_json::Value;

use crate::schema::ValueKind;

/// Incoming value wins.
pub fn replace(_current: Value, incoming: Value) -> Value {
    incoming
}

/// Incoming value wins only if it has `kind`.
pub fn replace_if(kind: ValueKind) -> impl Fn(Value, Value) -> Value + Send + Sync + 'static {
    move |current: Value, incoming: Value| {
        if kind.matches(&incoming) {
            incoming
        } else {
            current
        }
    }
}

/// Array field: an incoming array replaces the list, anything else is pushed.
pub fn append(current: Value, incoming: Value) -> Value {
    match (current, incoming) {
        (_, incoming @ Value::Array(_)) => incoming,
        (Value::Array(mut items), incoming) => {
            items.push(incoming);
            Value::Array(items)
        }
        (current, _) => current,
    }
}

/// Array field: an incoming array extends the list, anything else is pushed.
pub fn extend_or_push(current: Value, incoming: Value) -> Value {
    match (current, incoming) {
        (Value::Array(mut items), Value::Array(more)) => {
            items.extend(more);
            Value::Array(items)
        }
        (Value::Array(mut items), incoming) => {
            items.push(incoming);
            Value::Array(items)
        }
        (current, _) => current,
    }
}

/// Object field: copy incoming keys over the stored object.
pub fn merge_object(current: Value, incoming: Value) -> Value {
    match (current, incoming) {
        (Value::Object(mut map), Value::Object(more)) => {
            map.extend(more);
            Value::Object(map)
        }
        (current, _) => current,
    }
}

/// Object field: recursive merge via [`deep_merge`].
pub fn merge_deep(current: Value, incoming: Value) -> Value {
    match (current, incoming) {
        (current @ Value::Object(_), incoming @ Value::Object(_)) => {
            deep_merge(current, incoming)
        }
        (current, _) => current,
    }
}

/// Deep merge two JSON values.
///
/// - Objects: deep-merge by key (recursive)
/// - Arrays: REPLACE (second wins entirely)
/// - Scalars and null: second wins
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Export hook: keep only array elements of `kind`.
pub fn retain(kind: ValueKind) -> impl Fn(&Value) -> Value + Send + Sync + 'static {
    retain_where(move |item: &Value| kind.matches(item))
}

/// Export hook: keep only array elements satisfying `predicate`.
/// Non-array values pass through.
pub fn retain_where<P>(predicate: P) -> impl Fn(&Value) -> Value + Send + Sync + 'static
where
    P: Fn(&Value) -> bool + Send + Sync + 'static,
{
    move |value: &Value| match value {
        Value::Array(items) => {
            Value::Array(items.iter().filter(|item| predicate(*item)).cloned().collect())
        }
        other => other.clone(),
    }
}
