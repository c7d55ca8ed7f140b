//! Config instance: live values for one schema.

use fieldconf_store::ConfigFile;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::engine::{self, State, UpdateOutcome};
use crate::error::ConfigError;
use crate::schema::Schema;

/// A value read through [`Config::get`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entry<'a> {
    Field(&'a Value),
    /// Sub-key to value for every populated family entry.
    Family(&'a BTreeMap<String, Value>),
}

impl<'a> Entry<'a> {
    pub fn as_field(&self) -> Option<&'a Value> {
        match *self {
            Self::Field(value) => Some(value),
            Self::Family(_) => None,
        }
    }

    pub fn as_family(&self) -> Option<&'a BTreeMap<String, Value>> {
        match *self {
            Self::Family(entries) => Some(entries),
            Self::Field(_) => None,
        }
    }
}

/// Live configuration state for a [`Schema`].
///
/// Updates are tolerant: unknown keys, sub-keys outside a family's pattern
/// and values of the wrong kind are ignored and the stored value is kept.
#[derive(Debug, Clone)]
pub struct Config {
    schema: Arc<Schema>,
    state: State,
}

impl Config {
    /// Every field at its default, every family empty.
    pub fn new(schema: Arc<Schema>) -> Self {
        let state = State::new(&schema);
        Self { schema, state }
    }

    /// Defaults followed by one [`update`](Self::update) pass.
    pub fn with_overrides<I, K>(schema: Arc<Schema>, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut config = Self::new(schema);
        config.update(overrides);
        config
    }

    /// Defaults merged with the contents of `path`.
    ///
    /// A missing file yields defaults. A missing directory or malformed
    /// file is an error.
    pub fn from_file(schema: Arc<Schema>, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = ConfigFile::open(path, false)?;
        Ok(Self::with_overrides(schema, file.into_inner()))
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Apply each pair in order.
    pub fn update<I, K>(&mut self, data: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        for (key, value) in data {
            self.update_one(key.as_ref(), value);
        }
    }

    /// Apply a single pair and report what happened to it.
    pub fn update_one(&mut self, key: &str, value: Value) -> UpdateOutcome {
        engine::apply(&self.schema, &mut self.state, key, value)
    }

    /// Apply every member of a JSON object. Other values are ignored.
    pub fn update_value(&mut self, value: Value) {
        match value {
            Value::Object(map) => self.update(map),
            other => {
                tracing::debug!(
                    schema = self.schema.name(),
                    kind = %crate::ValueKind::of(&other),
                    "non-object update ignored"
                );
            }
        }
    }

    /// Merge the contents of `path` into this instance.
    ///
    /// Any failure to open or parse the file is swallowed and leaves the
    /// instance unchanged. The file itself is never rewritten.
    pub fn update_from_file(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        match ConfigFile::open(path, false) {
            Ok(file) => self.update(file.into_inner()),
            Err(e) => {
                tracing::warn!(
                    schema = self.schema.name(),
                    path = %path.display(),
                    error = %e,
                    "config file not loaded"
                );
            }
        }
    }

    /// Flat key/value view with export hooks applied. Family entries use
    /// `"<family> <sub_key>"` keys.
    pub fn export(&self) -> Map<String, Value> {
        engine::export(&self.schema, &self.state)
    }

    /// Replace the contents of `path` with [`export`](Self::export),
    /// creating the file if needed.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let exported = self.export();
        ConfigFile::scoped(path, true, |map| {
            map.clear();
            map.extend(exported);
            Ok::<_, ConfigError>(())
        })
    }

    /// Typed lookup of a declared field or family.
    pub fn get(&self, name: &str) -> Result<Entry<'_>, ConfigError> {
        if let Some(value) = self.field(name) {
            return Ok(Entry::Field(value));
        }
        if let Some(entries) = self.family(name) {
            return Ok(Entry::Family(entries));
        }
        Err(ConfigError::UnknownKey(name.to_string()))
    }

    /// Current value of a declared field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.state.values.get(name)
    }

    /// Current entries of a declared family.
    pub fn family(&self, name: &str) -> Option<&BTreeMap<String, Value>> {
        self.state.families.get(name)
    }

    /// Declared field names followed by family names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schema.field_names().chain(self.schema.family_names())
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.schema, &other.schema) || self.schema.name() == other.schema.name())
            && self.state == other.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers;
    use crate::schema::{FamilySpec, FieldSpec, ValueKind};
    use serde_json::json;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder("Servers")
                .field(FieldSpec::new("name", json!("")).accepts(ValueKind::String))
                .field(FieldSpec::new("ports", json!([])).merge(handlers::extend_or_push))
                .family(FamilySpec::new("host", r"\w+").accepts(ValueKind::String))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = Config::new(schema());
        assert_eq!(config.field("name"), Some(&json!("")));
        assert_eq!(config.field("ports"), Some(&json!([])));
        assert!(config.family("host").unwrap().is_empty());
    }

    #[test]
    fn test_get() {
        let mut config = Config::new(schema());
        config.update([("host web", json!("10.0.0.1"))]);

        assert_eq!(config.get("name").unwrap().as_field(), Some(&json!("")));
        let hosts = config.get("host").unwrap().as_family().unwrap();
        assert_eq!(hosts["web"], json!("10.0.0.1"));
        assert!(matches!(
            config.get("missing"),
            Err(ConfigError::UnknownKey(k)) if k == "missing"
        ));
    }

    #[test]
    fn test_update_one_reports_outcome() {
        let mut config = Config::new(schema());
        assert_eq!(config.update_one("ports", json!(22)), UpdateOutcome::Field);
        assert_eq!(config.update_one("ports", json!([80, 443])), UpdateOutcome::Field);
        assert!(!config.update_one("name", json!(22)).is_applied());
        assert_eq!(config.field("ports"), Some(&json!([22, 80, 443])));
        assert_eq!(config.field("name"), Some(&json!("")));
    }

    #[test]
    fn test_update_value() {
        let mut config = Config::new(schema());
        config.update_value(json!({"name": "prod", "host db": "10.0.0.2"}));
        config.update_value(json!(["ignored"]));

        assert_eq!(config.field("name"), Some(&json!("prod")));
        assert_eq!(config.family("host").unwrap()["db"], json!("10.0.0.2"));
    }

    #[test]
    fn test_same_key_applies_in_order() {
        let mut config = Config::new(schema());
        config.update(vec![
            ("ports".to_string(), json!(1)),
            ("ports".to_string(), json!(2)),
            ("name".to_string(), json!("a")),
            ("name".to_string(), json!("b")),
        ]);

        assert_eq!(config.field("ports"), Some(&json!([1, 2])));
        assert_eq!(config.field("name"), Some(&json!("b")));
    }

    #[test]
    fn test_keys() {
        let config = Config::new(schema());
        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["name", "ports", "host"]);
    }

    #[test]
    fn test_equality() {
        let schema = schema();
        let a = Config::with_overrides(Arc::clone(&schema), [("name", json!("x"))]);
        let b = Config::with_overrides(Arc::clone(&schema), [("name", json!("x"))]);
        let c = Config::new(schema);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
