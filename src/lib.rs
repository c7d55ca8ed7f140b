//! fieldconf - declarative configuration schemas
//!
//! A [`Schema`] declares named fields and pattern-keyed families, each with
//! a default, an accepted [`ValueKind`] and a merge handler, plus optional
//! export hooks. A [`Config`] holds live values for one schema, is updated
//! from arbitrary JSON key/value data, and round-trips through a JSON file.
//!
//! ```
//! use std::sync::Arc;
//! use fieldconf::{handlers, Config, FamilySpec, FieldSpec, Schema, ValueKind};
//! use serde_json::json;
//!
//! let schema = Arc::new(
//!     Schema::builder("Example")
//!         .field(FieldSpec::new("numbers", json!([])).merge(handlers::extend_or_push))
//!         .family(FamilySpec::new("host", r"\w+").accepts(ValueKind::String))
//!         .build()
//!         .unwrap(),
//! );
//!
//! let mut config = Config::new(schema);
//! config.update([("numbers", json!(1)), ("host web", json!("10.0.0.1"))]);
//! config.update([("numbers", json!(2))]);
//!
//! assert_eq!(config.field("numbers"), Some(&json!([1, 2])));
//! assert_eq!(config.export()["host web"], json!("10.0.0.1"));
//! ```

mod config;
mod engine;
mod error;
pub mod handlers;
pub mod schema;

pub use config::{Config, Entry};
pub use engine::{family_key, split_family_key, IgnoreReason, UpdateOutcome};
pub use error::{ConfigError, DefinitionError};
pub use fieldconf_store::{ConfigFile, StoreError};
pub use schema::{DefaultValue, FamilySpec, FieldSpec, Schema, SchemaBuilder, ValueKind};
