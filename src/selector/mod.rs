//! selector
//!
//! The selection expression engine and the full resolution pipeline.
//!
//! # Architecture
//!
//! A resolution flows through four stages:
//!
//! 1. Universe Builder - resolve the target environment (expiration,
//!    fallback), read its deployed snapshots, merge with the local registry
//! 2. Selection Expression Engine - evaluate the query language over the
//!    universe into a set of fully-qualified names
//! 3. Graph Closure - ancestor/descendant traversal used by closure
//!    modifiers
//! 4. Model Resolver - choose local vs. deployed recipe per unit and
//!    cascade structural schemas downstream
//!
//! # Error taxonomy
//!
//! *Absence* is never an error: missing environments, empty matches,
//! missing neighbors, and undeployed/unlocal units all resolve to "nothing
//! here". *Malformed expressions* surface as
//! [`SelectorError::InvalidSelection`]. *Collaborator failures* (state
//! store, Git client) propagate unchanged; nothing is retried or
//! suppressed.
//!
//! # Example
//!
//! ```
//! use meshwork::core::naming::{normalize, Dialect};
//! use meshwork::core::recipe::{Recipe, Registry};
//! use meshwork::git::MockGitClient;
//! use meshwork::selector::{Selector, SelectorOptions};
//! use meshwork::state::MemoryStateReader;
//!
//! let staged = normalize("db.staged", None, Dialect::Ansi).unwrap();
//! let mart = normalize("db.mart", None, Dialect::Ansi).unwrap();
//!
//! let mut registry = Registry::new();
//! registry
//!     .insert(Recipe::new(staged.clone(), "SELECT 1 AS a").with_tags(["hourly"]))
//!     .unwrap();
//! registry
//!     .insert(
//!         Recipe::new(mart.clone(), "SELECT * FROM db.staged")
//!             .with_dependencies([staged.clone()]),
//!     )
//!     .unwrap();
//!
//! let state = MemoryStateReader::new();
//! let git = MockGitClient::new();
//! let selector = Selector::new(&state, &registry, &git, SelectorOptions::default());
//!
//! // Tag match plus descendant closure reaches the mart.
//! let selected = selector
//!     .expand_unit_selections(&["tag:hourly+".to_string()])
//!     .unwrap();
//! assert!(selected.contains(&staged));
//! assert!(selected.contains(&mart));
//! ```

mod expression;
mod matcher;
mod resolve;
mod universe;

pub use expression::ParseError;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use thiserror::Error;

use crate::core::naming::{self, Dialect};
use crate::core::recipe::{Recipe, Registry};
use crate::core::snapshot::{Environment, SnapshotKind};
use crate::core::types::{UnitName, UtcTimestamp};
use crate::git::{GitClient, GitError};
use crate::state::{StateError, StateReader};

use expression::Expr;
use matcher::GlobMatcher;
use universe::Universe;

/// Errors from selection and resolution.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// A selection expression could not be understood. User-input error;
    /// never retried.
    #[error("invalid selection '{expression}': {message}")]
    InvalidSelection {
        /// The expression as supplied by the caller
        expression: String,
        /// What went wrong
        message: String,
    },

    /// The Git client failed; propagated unchanged.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The state store failed; propagated unchanged.
    #[error(transparent)]
    State(#[from] StateError),
}

impl SelectorError {
    fn invalid(expression: &str, message: impl std::fmt::Display) -> Self {
        Self::InvalidSelection {
            expression: expression.to_string(),
            message: message.to_string(),
        }
    }
}

/// Normalization settings for a selector.
///
/// Passed explicitly; there is no ambient default namespace or dialect.
#[derive(Debug, Clone, Default)]
pub struct SelectorOptions {
    /// Namespace prefix applied to unqualified (two-segment) names.
    pub default_namespace: Option<String>,
    /// Quoting convention for raw names and patterns.
    pub dialect: Dialect,
}

/// The selection & resolution engine.
///
/// Holds no long-lived mutable state: every call builds its universe and
/// result fresh, so many resolutions may run concurrently as long as the
/// collaborators are safe for concurrent reads.
pub struct Selector<'a> {
    state: &'a dyn StateReader,
    registry: &'a Registry,
    git: &'a dyn GitClient,
    options: SelectorOptions,
}

impl<'a> Selector<'a> {
    /// Create a selector over a local registry and its collaborators.
    pub fn new(
        state: &'a dyn StateReader,
        registry: &'a Registry,
        git: &'a dyn GitClient,
        options: SelectorOptions,
    ) -> Self {
        Self {
            state,
            registry,
            git,
            options,
        }
    }

    /// Evaluate selection expressions over the local registry.
    ///
    /// Expressions are combined by set union. The result is always a subset
    /// of the registry's names; an expression that matches nothing yields
    /// the empty set, which is a valid, non-error result.
    ///
    /// # Errors
    ///
    /// - [`SelectorError::InvalidSelection`] for malformed expressions
    /// - [`SelectorError::Git`] if a `git:` atom's change listing fails
    pub fn expand_unit_selections(
        &self,
        selections: &[String],
    ) -> Result<BTreeSet<UnitName>, SelectorError> {
        let universe = Universe::build(self.registry, BTreeMap::new());
        self.expand_in(&universe, selections)
    }

    /// Run the full pipeline: universe build, expression expansion, recipe
    /// choice, and schema cascade.
    ///
    /// For every unit in the merged universe: selected units use their
    /// local recipe (a selected unit with no local definition contributes
    /// nothing); unselected units fall back to their deployed recipe.
    /// Mapping schemas and fingerprints in the result reflect the upstream
    /// shapes actually present in it.
    ///
    /// # Errors
    ///
    /// - [`SelectorError::InvalidSelection`] for malformed expressions
    /// - [`SelectorError::State`] / [`SelectorError::Git`] on collaborator
    ///   failure
    pub fn select_units(
        &self,
        selections: &[String],
        env_name: &str,
        fallback_env_name: Option<&str>,
    ) -> Result<BTreeMap<UnitName, Recipe>, SelectorError> {
        let remote = self.remote_registry(env_name, fallback_env_name)?;
        let universe = Universe::build(self.registry, remote);
        let selected = self.expand_in(&universe, selections)?;
        Ok(resolve::resolve(&universe, &selected))
    }

    /// Resolve the environment name, honoring expiration and trying the
    /// fallback once. Absence at every step is a valid, silent state.
    fn resolve_environment(
        &self,
        env_name: &str,
        fallback_env_name: Option<&str>,
    ) -> Result<Option<Environment>, SelectorError> {
        let now = UtcTimestamp::now();

        if let Some(env) = self.state.get_environment(env_name)? {
            if !env.is_expired(&now) {
                return Ok(Some(env));
            }
        }
        if let Some(fallback) = fallback_env_name {
            if let Some(env) = self.state.get_environment(fallback)? {
                if !env.is_expired(&now) {
                    return Ok(Some(env));
                }
            }
        }
        Ok(None)
    }

    /// Read the deployed recipes of the resolved environment, dropping
    /// snapshots that do not bind transformable units.
    fn remote_registry(
        &self,
        env_name: &str,
        fallback_env_name: Option<&str>,
    ) -> Result<BTreeMap<UnitName, Recipe>, SelectorError> {
        let Some(env) = self.resolve_environment(env_name, fallback_env_name)? else {
            return Ok(BTreeMap::new());
        };

        let snapshots = self.state.get_snapshots(&env.snapshots)?;
        Ok(snapshots
            .into_values()
            .filter(|snapshot| snapshot.kind == SnapshotKind::Unit)
            .map(|snapshot| (snapshot.recipe.name.clone(), snapshot.recipe))
            .collect())
    }

    fn expand_in(
        &self,
        universe: &Universe,
        selections: &[String],
    ) -> Result<BTreeSet<UnitName>, SelectorError> {
        // One memoization boundary per top-level call: the Git change sets
        // are fetched at most once no matter how many git: atoms appear.
        let mut changes = GitChangeSets::new(self.git);

        let mut result = BTreeSet::new();
        for raw in selections {
            let expr =
                expression::parse(raw).map_err(|e| SelectorError::invalid(raw, e))?;
            result.extend(self.eval(&expr, universe, &mut changes, raw)?);
        }
        Ok(result)
    }

    fn eval(
        &self,
        expr: &Expr,
        universe: &Universe,
        changes: &mut GitChangeSets<'_>,
        raw: &str,
    ) -> Result<BTreeSet<UnitName>, SelectorError> {
        match expr {
            Expr::Name(pattern) => {
                let pattern = naming::normalize_pattern(
                    pattern,
                    self.options.default_namespace.as_deref(),
                    self.options.dialect,
                )
                .map_err(|e| SelectorError::invalid(raw, e))?;
                let matcher = GlobMatcher::compile(&pattern)
                    .map_err(|e| SelectorError::invalid(raw, e))?;
                Ok(universe
                    .names()
                    .filter(|name| matcher.is_match(&name.text()))
                    .cloned()
                    .collect())
            }
            Expr::Tag(pattern) => {
                let matcher = GlobMatcher::compile(pattern)
                    .map_err(|e| SelectorError::invalid(raw, e))?;
                Ok(universe
                    .names()
                    .filter(|name| {
                        universe
                            .tags(name)
                            .is_some_and(|tags| tags.iter().any(|tag| matcher.is_match(tag)))
                    })
                    .cloned()
                    .collect())
            }
            Expr::Git(branch) => {
                let changed = changes.changed_paths(branch)?;
                Ok(universe
                    .names()
                    .filter(|name| {
                        universe
                            .source_path(name)
                            .is_some_and(|path| changed.contains(path))
                    })
                    .cloned()
                    .collect())
            }
            Expr::Not(inner) => {
                let inner = self.eval(inner, universe, changes, raw)?;
                Ok(universe
                    .names()
                    .filter(|name| !inner.contains(*name))
                    .cloned()
                    .collect())
            }
            Expr::And(left, right) => {
                let left = self.eval(left, universe, changes, raw)?;
                let right = self.eval(right, universe, changes, raw)?;
                Ok(left.intersection(&right).cloned().collect())
            }
            Expr::Or(left, right) => {
                let left = self.eval(left, universe, changes, raw)?;
                let right = self.eval(right, universe, changes, raw)?;
                Ok(left.union(&right).cloned().collect())
            }
            Expr::Closure {
                inner,
                upstream,
                downstream,
            } => {
                let matched = self.eval(inner, universe, changes, raw)?;
                let mut result = matched.clone();
                for name in &matched {
                    // Each direction expands from the un-expanded match.
                    if *upstream {
                        result.extend(universe.graph().ancestors(name));
                    }
                    if *downstream {
                        result.extend(universe.graph().descendants(name));
                    }
                }
                Ok(result)
            }
        }
    }
}

/// Per-call memoization of the Git change oracle.
///
/// The worktree sets (untracked + uncommitted) are shared across branches;
/// the committed diff is memoized per target branch.
struct GitChangeSets<'a> {
    client: &'a dyn GitClient,
    worktree: Option<HashSet<PathBuf>>,
    committed: HashMap<String, HashSet<PathBuf>>,
}

impl<'a> GitChangeSets<'a> {
    fn new(client: &'a dyn GitClient) -> Self {
        Self {
            client,
            worktree: None,
            committed: HashMap::new(),
        }
    }

    fn changed_paths(&mut self, branch: &str) -> Result<HashSet<PathBuf>, GitError> {
        if self.worktree.is_none() {
            let mut set: HashSet<PathBuf> =
                self.client.list_untracked_files()?.into_iter().collect();
            set.extend(self.client.list_uncommitted_changed_files()?);
            self.worktree = Some(set);
        }
        if !self.committed.contains_key(branch) {
            let files = self.client.list_committed_changed_files(branch)?;
            self.committed
                .insert(branch.to_string(), files.into_iter().collect());
        }

        let mut union = self.worktree.clone().unwrap_or_default();
        if let Some(files) = self.committed.get(branch) {
            union.extend(files.iter().cloned());
        }
        Ok(union)
    }
}
