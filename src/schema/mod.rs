//! Field registry
//!
//! Schemas are declared explicitly through a [`SchemaBuilder`]:
//! - fields: a single named value with a default and a merge handler
//! - families: values keyed by a sub-key matching a pattern
//! - export hooks: post-processing applied by [`crate::Config::export`]

mod field;
mod kind;
mod registry;

pub use field::{DefaultValue, ExportFn, FamilySpec, FieldSpec, MergeFn};
pub use kind::ValueKind;
pub use registry::{
    Family, FamilyDescription, FieldDescription, Schema, SchemaBuilder, SchemaDescription,
};
