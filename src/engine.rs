//! Merge engine
//!
//! Routes each incoming `(key, value)` pair to a field or family entry:
//! 1. exact field name: type gate, then the field's merge handler
//! 2. `"<family> <sub_key>"`: family lookup, sub-key pattern, type gate,
//!    lazy entry creation, then the family's merge handler
//! 3. anything else is ignored
//!
//! Export walks the same metadata in reverse into a flat JSON object.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::schema::Schema;

/// Result of applying one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// An ordinary field handler ran.
    Field,
    /// A family entry handler ran.
    FamilyEntry,
    /// Nothing was changed.
    Ignored(IgnoreReason),
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::Ignored(_))
    }
}

/// Why a key was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Neither a field name nor a `"<family> <sub_key>"` pair.
    UnknownKey,
    /// Two tokens, but the first is not a declared family.
    UnknownFamily,
    /// The sub-key does not match the family pattern.
    SubKeyMismatch,
    /// The value has the wrong kind for the field or family.
    TypeMismatch,
}

/// Live values for one instance.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct State {
    pub values: BTreeMap<String, Value>,
    pub families: BTreeMap<String, BTreeMap<String, Value>>,
}

impl State {
    /// Fresh defaults for every field and an empty map per family.
    pub fn new(schema: &Schema) -> Self {
        let values = schema
            .fields()
            .map(|spec| (spec.key().to_string(), spec.default_value().instantiate()))
            .collect();
        let families = schema
            .family_names()
            .map(|name| (name.to_string(), BTreeMap::new()))
            .collect();
        Self { values, families }
    }
}

/// Split `"<family> <sub_key>"` on the first whitespace run.
///
/// Returns `None` unless both halves are non-empty. The sub-key keeps any
/// further whitespace; the family pattern decides whether it is valid.
pub fn split_family_key(key: &str) -> Option<(&str, &str)> {
    let split = key.find(char::is_whitespace)?;
    let family = &key[..split];
    let sub_key = key[split..].trim_start();
    if family.is_empty() || sub_key.is_empty() {
        return None;
    }
    Some((family, sub_key))
}

/// Join a family name and sub-key into the flat export key.
pub fn family_key(family: &str, sub_key: &str) -> String {
    format!("{} {}", family, sub_key)
}

pub(crate) fn apply(schema: &Schema, state: &mut State, key: &str, raw: Value) -> UpdateOutcome {
    let outcome = apply_inner(schema, state, key, raw);
    if let UpdateOutcome::Ignored(reason) = outcome {
        tracing::debug!(schema = schema.name(), key, ?reason, "config key ignored");
    }
    outcome
}

fn apply_inner(schema: &Schema, state: &mut State, key: &str, raw: Value) -> UpdateOutcome {
    if let Some(spec) = schema.field(key) {
        if !spec.kind().matches(&raw) {
            return UpdateOutcome::Ignored(IgnoreReason::TypeMismatch);
        }
        let slot = state
            .values
            .entry(key.to_string())
            .or_insert_with(|| spec.default_value().instantiate());
        let current = std::mem::take(slot);
        *slot = spec.apply(current, raw);
        return UpdateOutcome::Field;
    }

    let Some((family_name, sub_key)) = split_family_key(key) else {
        return UpdateOutcome::Ignored(IgnoreReason::UnknownKey);
    };
    let Some(family) = schema.family(family_name) else {
        return UpdateOutcome::Ignored(IgnoreReason::UnknownFamily);
    };
    if !family.matches(sub_key) {
        return UpdateOutcome::Ignored(IgnoreReason::SubKeyMismatch);
    }
    let spec = family.spec();
    if !spec.kind().matches(&raw) {
        return UpdateOutcome::Ignored(IgnoreReason::TypeMismatch);
    }

    let slot = state
        .families
        .entry(family_name.to_string())
        .or_default()
        .entry(sub_key.to_string())
        .or_insert_with(|| spec.default_value().instantiate());
    let current = std::mem::take(slot);
    *slot = spec.apply(current, raw);
    UpdateOutcome::FamilyEntry
}

pub(crate) fn export(schema: &Schema, state: &State) -> Map<String, Value> {
    let mut out = Map::new();

    for name in schema.field_names() {
        let Some(value) = state.values.get(name) else {
            continue;
        };
        let exported = match schema.export_hook(name) {
            Some(hook) => hook(value),
            None => value.clone(),
        };
        out.insert(name.to_string(), exported);
    }

    for name in schema.family_names() {
        let Some(entries) = state.families.get(name) else {
            continue;
        };
        let hook = schema.export_hook(name);
        for (sub_key, value) in entries {
            let exported = match hook {
                Some(hook) => hook(value),
                None => value.clone(),
            };
            out.insert(family_key(name, sub_key), exported);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FamilySpec, FieldSpec, ValueKind};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder("Engine")
            .field(FieldSpec::new("flag", json!(false)).accepts(ValueKind::Bool))
            .field(FieldSpec::new("anything", json!(null)))
            .family(
                FamilySpec::new("port", r"[a-z]+")
                    .default(json!(0))
                    .accepts(ValueKind::Integer)
                    .merge(|current, incoming| {
                        json!(current.as_i64().unwrap_or(0) + incoming.as_i64().unwrap_or(0))
                    }),
            )
            .export("port", |v: &Value| json!(v.as_i64().unwrap_or(0) * 10))
            .build()
            .unwrap()
    }

    #[test]
    fn test_split_family_key() {
        assert_eq!(split_family_key("host mario"), Some(("host", "mario")));
        assert_eq!(split_family_key("host \t mario"), Some(("host", "mario")));
        assert_eq!(split_family_key("host a b"), Some(("host", "a b")));
        assert_eq!(split_family_key("host"), None);
        assert_eq!(split_family_key("host "), None);
        assert_eq!(split_family_key(" host"), None);
        assert_eq!(split_family_key(""), None);
    }

    #[test]
    fn test_initial_state() {
        let schema = schema();
        let state = State::new(&schema);
        assert_eq!(state.values["flag"], json!(false));
        assert_eq!(state.values["anything"], json!(null));
        assert!(state.families["port"].is_empty());
    }

    #[test]
    fn test_field_type_gate() {
        let schema = schema();
        let mut state = State::new(&schema);

        let outcome = apply(&schema, &mut state, "flag", json!(0));
        assert_eq!(outcome, UpdateOutcome::Ignored(IgnoreReason::TypeMismatch));
        assert_eq!(state.values["flag"], json!(false));

        let outcome = apply(&schema, &mut state, "flag", json!(true));
        assert_eq!(outcome, UpdateOutcome::Field);
        assert_eq!(state.values["flag"], json!(true));
    }

    #[test]
    fn test_family_dispatch() {
        let schema = schema();
        let mut state = State::new(&schema);

        assert_eq!(
            apply(&schema, &mut state, "port web", json!(80)),
            UpdateOutcome::FamilyEntry
        );
        assert_eq!(
            apply(&schema, &mut state, "port web", json!(1)),
            UpdateOutcome::FamilyEntry
        );
        assert_eq!(state.families["port"]["web"], json!(81));
    }

    #[test]
    fn test_family_rejections() {
        let schema = schema();
        let mut state = State::new(&schema);

        assert_eq!(
            apply(&schema, &mut state, "port", json!(1)),
            UpdateOutcome::Ignored(IgnoreReason::UnknownKey)
        );
        assert_eq!(
            apply(&schema, &mut state, "nope web", json!(1)),
            UpdateOutcome::Ignored(IgnoreReason::UnknownFamily)
        );
        assert_eq!(
            apply(&schema, &mut state, "port WEB", json!(1)),
            UpdateOutcome::Ignored(IgnoreReason::SubKeyMismatch)
        );
        assert_eq!(
            apply(&schema, &mut state, "port web", json!("80")),
            UpdateOutcome::Ignored(IgnoreReason::TypeMismatch)
        );

        // Rejected values never create an entry.
        assert!(state.families["port"].is_empty());
    }

    #[test]
    fn test_export_applies_hooks_per_entry() {
        let schema = schema();
        let mut state = State::new(&schema);
        apply(&schema, &mut state, "port web", json!(8));
        apply(&schema, &mut state, "port db", json!(5));

        let out = export(&schema, &state);
        assert_eq!(out["flag"], json!(false));
        assert_eq!(out["anything"], json!(null));
        assert_eq!(out["port web"], json!(80));
        assert_eq!(out["port db"], json!(50));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_outcome_is_applied() {
        assert!(UpdateOutcome::Field.is_applied());
        assert!(UpdateOutcome::FamilyEntry.is_applied());
        assert!(!UpdateOutcome::Ignored(IgnoreReason::UnknownKey).is_applied());
    }
}
