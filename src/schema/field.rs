//! Field and family declarations.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::ValueKind;

/// Merge handler: `(current, incoming) -> new`.
///
/// Handlers must be total. An unacceptable `incoming` value is reconciled by
/// returning `current` unchanged.
pub type MergeFn = Arc<dyn Fn(Value, Value) -> Value + Send + Sync>;

/// Export hook: `stored -> exported`.
pub type ExportFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Initial value of a field or of a lazily created family entry.
#[derive(Clone)]
pub enum DefaultValue {
    /// Cloned into every instance; containers are never shared.
    Fixed(Value),
    /// Called once per instance (or per family entry).
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }

    /// Produce a fresh value.
    pub fn instantiate(&self) -> Value {
        match self {
            Self::Fixed(value) => value.clone(),
            Self::Factory(f) => f(),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        Self::Fixed(value)
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

fn replace_handler() -> MergeFn {
    Arc::new(|_current, incoming| incoming)
}

/// An ordinary named field.
#[derive(Clone)]
pub struct FieldSpec {
    key: String,
    default: DefaultValue,
    accepts: ValueKind,
    merge: MergeFn,
}

impl FieldSpec {
    /// Declare a field that accepts any value and replaces on update.
    pub fn new(key: impl Into<String>, default: impl Into<DefaultValue>) -> Self {
        Self {
            key: key.into(),
            default: default.into(),
            accepts: ValueKind::Any,
            merge: replace_handler(),
        }
    }

    /// Restrict incoming values to `kind`; others are rejected by the engine.
    pub fn accepts(mut self, kind: ValueKind) -> Self {
        self.accepts = kind;
        self
    }

    /// Set the merge handler.
    pub fn merge<F>(mut self, handler: F) -> Self
    where
        F: Fn(Value, Value) -> Value + Send + Sync + 'static,
    {
        self.merge = Arc::new(handler);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    pub fn kind(&self) -> ValueKind {
        self.accepts
    }

    pub(crate) fn apply(&self, current: Value, incoming: Value) -> Value {
        (self.merge)(current, incoming)
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("key", &self.key)
            .field("default", &self.default)
            .field("accepts", &self.accepts)
            .finish_non_exhaustive()
    }
}

/// A family of values keyed by `"<family> <sub_key>"`, where `sub_key`
/// must fully match `pattern`.
#[derive(Clone)]
pub struct FamilySpec {
    key: String,
    pattern: String,
    default: DefaultValue,
    accepts: ValueKind,
    merge: MergeFn,
}

impl FamilySpec {
    /// Declare a family whose entries start as `null` and are replaced on
    /// update.
    pub fn new(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            pattern: pattern.into(),
            default: DefaultValue::Fixed(Value::Null),
            accepts: ValueKind::Any,
            merge: replace_handler(),
        }
    }

    pub fn default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = default.into();
        self
    }

    pub fn accepts(mut self, kind: ValueKind) -> Self {
        self.accepts = kind;
        self
    }

    pub fn merge<F>(mut self, handler: F) -> Self
    where
        F: Fn(Value, Value) -> Value + Send + Sync + 'static,
    {
        self.merge = Arc::new(handler);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    pub fn kind(&self) -> ValueKind {
        self.accepts
    }

    pub(crate) fn apply(&self, current: Value, incoming: Value) -> Value {
        (self.merge)(current, incoming)
    }
}

impl fmt::Debug for FamilySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilySpec")
            .field("key", &self.key)
            .field("pattern", &self.pattern)
            .field("default", &self.default)
            .field("accepts", &self.accepts)
            .finish_non_exhaustive()
    }
}
