//! Shared schemas and fixture files for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use fieldconf::{handlers, FamilySpec, FieldSpec, Schema, ValueKind};
use serde_json::{json, Value};

/// Path to a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Five ordinary fields covering the stock handlers, plus an export hook
/// that keeps only integers in `numbers`.
pub fn example_schema() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            let schema = Schema::builder("Example")
                .field(
                    FieldSpec::new("hello", json!(""))
                        .merge(handlers::replace_if(ValueKind::String)),
                )
                .field(FieldSpec::new("goodbye", json!([])).merge(handlers::append))
                .field(FieldSpec::new("other", json!({})).merge(handlers::merge_object))
                .field(FieldSpec::new("is_false", json!(false)).accepts(ValueKind::Bool))
                .field(FieldSpec::new("numbers", json!([])).merge(handlers::extend_or_push))
                .export("numbers", handlers::retain(ValueKind::Integer))
                .build()
                .expect("example schema is valid");
            Arc::new(schema)
        })
        .clone()
}

/// The example fields plus two families.
pub fn family_schema() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            let schema = fieldconf::SchemaBuilder::extend("FamilyExample", &example_schema())
                .family(FamilySpec::new("regex_string", r"\w+").accepts(ValueKind::String))
                .family(
                    FamilySpec::new("regex_list", r"[a-z]+")
                        .default(json!([]))
                        .merge(handlers::extend_or_push),
                )
                .export("regex_list", handlers::retain(ValueKind::Integer))
                .build()
                .expect("family schema is valid");
            Arc::new(schema)
        })
        .clone()
}

pub fn abcd() -> Value {
    json!({"a": "b", "c": "d"})
}

pub fn efgh() -> Value {
    json!({"e": "f", "g": "h"})
}

pub fn all_letters() -> Value {
    json!({"a": "b", "c": "d", "e": "f", "g": "h"})
}
