//! Error types.
//!
//! Definition errors are raised while building a schema. Per-key update
//! rejections are never errors; see [`crate::UpdateOutcome`].

use fieldconf_store::StoreError;

/// Schema authoring mistakes, reported by [`crate::SchemaBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("Invalid key {0:?}: keys must be non-empty and contain no whitespace")]
    InvalidKey(String),

    #[error("Field {0:?} is declared more than once")]
    DuplicateField(String),

    #[error("Family {0:?} is declared more than once")]
    DuplicateFamily(String),

    #[error("Export hook for {0:?} is declared more than once")]
    DuplicateExport(String),

    #[error("Key {0:?} is declared as both a field and a family")]
    NamespaceCollision(String),

    #[error("Export hook for {0:?} has no matching field or family")]
    OrphanExport(String),

    #[error("Invalid pattern for family {family:?}: {source}")]
    InvalidPattern {
        family: String,
        #[source]
        source: regex_lite::Error,
    },
}

/// Runtime errors from a [`crate::Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
