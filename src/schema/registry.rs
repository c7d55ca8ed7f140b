//! Schema registry: turns declarations into immutable metadata.
//!
//! Declarations are collected by a [`SchemaBuilder`] and validated once in
//! [`SchemaBuilder::build`]. A builder created with
//! [`SchemaBuilder::extend`] starts from its parent's metadata; the child's
//! declarations are applied after the parent's, so a re-declared key
//! replaces the inherited one.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use super::{ExportFn, FamilySpec, FieldSpec, ValueKind};
use crate::error::DefinitionError;

/// A family declaration with its compiled, whole-key-anchored pattern.
#[derive(Debug, Clone)]
pub struct Family {
    spec: FamilySpec,
    regex: Regex,
}

impl Family {
    fn compile(spec: FamilySpec) -> Result<Self, DefinitionError> {
        let anchored = format!("^(?:{})$", spec.pattern());
        let regex = Regex::new(&anchored).map_err(|source| DefinitionError::InvalidPattern {
            family: spec.key().to_string(),
            source,
        })?;
        Ok(Self { spec, regex })
    }

    pub fn spec(&self) -> &FamilySpec {
        &self.spec
    }

    /// Whether `sub_key` belongs to this family.
    pub fn matches(&self, sub_key: &str) -> bool {
        self.regex.is_match(sub_key)
    }
}

/// Collects field, family and export declarations for one schema.
pub struct SchemaBuilder {
    name: String,
    fields: BTreeMap<String, FieldSpec>,
    families: BTreeMap<String, FamilySpec>,
    exports: BTreeMap<String, ExportFn>,
    /// Keys and hooks taken from a parent schema that may still be overridden.
    inherited: BTreeSet<String>,
    inherited_exports: BTreeSet<String>,
    error: Option<DefinitionError>,
}

fn valid_key(key: &str) -> bool {
    !key.is_empty() && !key.chars().any(char::is_whitespace)
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            families: BTreeMap::new(),
            exports: BTreeMap::new(),
            inherited: BTreeSet::new(),
            inherited_exports: BTreeSet::new(),
            error: None,
        }
    }

    /// Start a child schema from `parent`'s declarations.
    pub fn extend(name: impl Into<String>, parent: &Schema) -> Self {
        let mut builder = Self::new(name);
        for (key, spec) in &parent.fields {
            builder.fields.insert(key.clone(), spec.clone());
            builder.inherited.insert(key.clone());
        }
        for (key, family) in &parent.families {
            builder.families.insert(key.clone(), family.spec.clone());
            builder.inherited.insert(key.clone());
        }
        for (key, hook) in &parent.exports {
            builder.exports.insert(key.clone(), Arc::clone(hook));
            builder.inherited_exports.insert(key.clone());
        }
        builder
    }

    fn fail(&mut self, error: DefinitionError) {
        // Keep the first error; later ones are usually knock-on effects.
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Declare an ordinary field.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        let key = spec.key().to_string();
        if !valid_key(&key) {
            self.fail(DefinitionError::InvalidKey(key));
            return self;
        }

        let inherited = self.inherited.remove(&key);
        if self.fields.contains_key(&key) && !inherited {
            self.fail(DefinitionError::DuplicateField(key));
            return self;
        }
        if self.families.contains_key(&key) {
            if !inherited {
                self.fail(DefinitionError::NamespaceCollision(key));
                return self;
            }
            self.families.remove(&key);
        }

        self.fields.insert(key, spec);
        self
    }

    /// Declare a family of sub-keyed values.
    pub fn family(mut self, spec: FamilySpec) -> Self {
        let key = spec.key().to_string();
        if !valid_key(&key) {
            self.fail(DefinitionError::InvalidKey(key));
            return self;
        }

        let inherited = self.inherited.remove(&key);
        if self.families.contains_key(&key) && !inherited {
            self.fail(DefinitionError::DuplicateFamily(key));
            return self;
        }
        if self.fields.contains_key(&key) {
            if !inherited {
                self.fail(DefinitionError::NamespaceCollision(key));
                return self;
            }
            self.fields.remove(&key);
        }

        self.families.insert(key, spec);
        self
    }

    /// Attach an export hook to a field or family (applied per entry for
    /// families). The target may be declared before or after the hook.
    pub fn export<F>(mut self, key: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&serde_json::Value) -> serde_json::Value + Send + Sync + 'static,
    {
        let key = key.into();
        let inherited = self.inherited_exports.remove(&key);
        if self.exports.contains_key(&key) && !inherited {
            self.fail(DefinitionError::DuplicateExport(key));
            return self;
        }
        self.exports.insert(key, Arc::new(hook));
        self
    }

    /// Validate the declarations and freeze them into a [`Schema`].
    pub fn build(self) -> Result<Schema, DefinitionError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        if let Some(orphan) = self
            .exports
            .keys()
            .find(|key| !self.fields.contains_key(*key) && !self.families.contains_key(*key))
        {
            return Err(DefinitionError::OrphanExport(orphan.clone()));
        }

        let mut families = BTreeMap::new();
        for (key, spec) in self.families {
            families.insert(key, Family::compile(spec)?);
        }

        tracing::debug!(
            schema = %self.name,
            fields = self.fields.len(),
            families = families.len(),
            exports = self.exports.len(),
            "schema built"
        );

        Ok(Schema {
            name: self.name,
            fields: self.fields,
            families,
            exports: self.exports,
        })
    }
}

/// Immutable metadata for one configuration schema.
pub struct Schema {
    name: String,
    fields: BTreeMap<String, FieldSpec>,
    families: BTreeMap<String, Family>,
    exports: BTreeMap<String, ExportFn>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.get(key)
    }

    pub fn family(&self, key: &str) -> Option<&Family> {
        self.families.get(key)
    }

    pub fn export_hook(&self, key: &str) -> Option<&ExportFn> {
        self.exports.get(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn families(&self) -> impl Iterator<Item = &Family> {
        self.families.values()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn family_names(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    /// Whether `name` is a declared field or family.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.families.contains_key(name)
    }

    /// Serializable summary of the declared keys.
    pub fn describe(&self) -> SchemaDescription {
        SchemaDescription {
            name: self.name.clone(),
            fields: self
                .fields
                .iter()
                .map(|(key, spec)| {
                    let desc = FieldDescription {
                        kind: spec.kind(),
                        exported: self.exports.contains_key(key),
                    };
                    (key.clone(), desc)
                })
                .collect(),
            families: self
                .families
                .iter()
                .map(|(key, family)| {
                    let desc = FamilyDescription {
                        pattern: family.spec.pattern().to_string(),
                        kind: family.spec.kind(),
                        exported: self.exports.contains_key(key),
                    };
                    (key.clone(), desc)
                })
                .collect(),
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("families", &self.families.keys().collect::<Vec<_>>())
            .field("exports", &self.exports.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Summary of a schema, as produced by [`Schema::describe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub name: String,
    pub fields: BTreeMap<String, FieldDescription>,
    pub families: BTreeMap<String, FamilyDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub kind: ValueKind,
    /// Whether an export hook post-processes this field.
    pub exported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyDescription {
    pub pattern: String,
    pub kind: ValueKind,
    pub exported: bool,
}
