//! core::recipe
//!
//! Unit definitions as authored, and the local registry that holds them.
//!
//! # Types
//!
//! - [`Recipe`] - A unit's payload, tags, dependencies, and structural schema
//! - [`Registry`] - Ordered, unique-keyed map of local recipes
//!
//! # Structural schema
//!
//! A recipe's mapping schema is *built, not authored*: the resolution
//! pipeline rebuilds it from the output shapes of the upstreams actually
//! present in a result. The fingerprint is derived from the payload and the
//! mapping schema on demand, so it can never go stale.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{Fingerprint, UnitName};

/// Output shape of a unit: column name to type name.
pub type ColumnTypes = BTreeMap<String, String>;

/// Structural schema: each resolved upstream's output shape, keyed by the
/// upstream's name.
pub type MappingSchema = BTreeMap<UnitName, ColumnTypes>;

/// Errors from registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A recipe with the same name is already registered.
    #[error("duplicate unit in registry: {0}")]
    Duplicate(UnitName),
}

/// The definition of a unit as authored.
///
/// The content payload is opaque to the resolution engine; only its bytes
/// participate in the fingerprint. `columns` is the unit's intrinsic output
/// shape, used as the schema entry for downstream consumers.
///
/// # Example
///
/// ```
/// use meshwork::core::naming::{normalize, Dialect};
/// use meshwork::core::recipe::Recipe;
///
/// let parent = normalize("db.parent", None, Dialect::Ansi).unwrap();
/// let child = normalize("db.child", None, Dialect::Ansi).unwrap();
///
/// let recipe = Recipe::new(child, "SELECT * FROM db.parent")
///     .with_dependencies([parent])
///     .with_tags(["daily"])
///     .with_columns([("a", "INT")]);
///
/// assert_eq!(recipe.tags.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Fully-qualified, normalized unit name.
    pub name: UnitName,

    /// Opaque content payload.
    pub payload: String,

    /// Declared upstream dependencies.
    pub depends_on: BTreeSet<UnitName>,

    /// Declared tags; order-irrelevant.
    pub tags: BTreeSet<String>,

    /// Intrinsic output shape.
    pub columns: ColumnTypes,

    /// Resolved upstream shapes; rebuilt by resolution, never authored.
    pub mapping_schema: MappingSchema,

    /// On-disk source location, when the unit was loaded from a file.
    /// Units without one never match `git:` selections.
    pub source_path: Option<PathBuf>,
}

impl Recipe {
    /// Create a recipe with no dependencies, tags, or columns.
    pub fn new(name: UnitName, payload: impl Into<String>) -> Self {
        Self {
            name,
            payload: payload.into(),
            depends_on: BTreeSet::new(),
            tags: BTreeSet::new(),
            columns: ColumnTypes::new(),
            mapping_schema: MappingSchema::new(),
            source_path: None,
        }
    }

    /// Set the declared upstream dependencies.
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = UnitName>) -> Self {
        self.depends_on = deps.into_iter().collect();
        self
    }

    /// Set the declared tags.
    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the intrinsic output shape.
    pub fn with_columns<K, V>(mut self, columns: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.columns = columns
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Set the mapping schema (normally done by resolution).
    pub fn with_mapping_schema(mut self, schema: MappingSchema) -> Self {
        self.mapping_schema = schema;
        self
    }

    /// Set the on-disk source location.
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// The unit's source location, if it has one.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Compute the content fingerprint of this recipe.
    ///
    /// Derived from the payload and the current mapping schema. Recomputing
    /// the schema while leaving the payload untouched changes the result.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut lines = Vec::new();
        for (upstream, columns) in &self.mapping_schema {
            lines.push(upstream.to_string());
            for (column, column_type) in columns {
                lines.push(format!("{upstream}\0{column}\0{column_type}"));
            }
        }
        Fingerprint::compute(&self.payload, lines)
    }
}

/// An ordered, unique-keyed mapping from unit name to recipe.
///
/// This is the local registry: the authoritative definitions currently on
/// disk, loaded elsewhere and supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    recipes: BTreeMap<UnitName, Recipe>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe under its own name.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Duplicate` if the name is already registered.
    pub fn insert(&mut self, recipe: Recipe) -> Result<(), RegistryError> {
        if self.recipes.contains_key(&recipe.name) {
            return Err(RegistryError::Duplicate(recipe.name));
        }
        self.recipes.insert(recipe.name.clone(), recipe);
        Ok(())
    }

    /// Look up a recipe by name.
    pub fn get(&self, name: &UnitName) -> Option<&Recipe> {
        self.recipes.get(name)
    }

    /// Whether a name is registered.
    pub fn contains(&self, name: &UnitName) -> bool {
        self.recipes.contains_key(name)
    }

    /// Iterate over recipes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&UnitName, &Recipe)> {
        self.recipes.iter()
    }

    /// Iterate over registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &UnitName> {
        self.recipes.keys()
    }

    /// Number of registered recipes.
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
