//! core::snapshot
//!
//! Deployed state: snapshots and environments.
//!
//! # Types
//!
//! - [`Snapshot`] - An immutable, versioned record binding a unit name to
//!   one deployed recipe
//! - [`SnapshotId`] - Stable snapshot identity (name plus content identifier)
//! - [`Environment`] - A named pointer to a set of deployed snapshots
//!
//! Environments reference snapshots by id, never raw recipes. An
//! environment whose expiration instant is at or before "now" acts exactly
//! like a missing environment.

use serde::{Deserialize, Serialize};

use crate::core::recipe::Recipe;
use crate::core::types::{UnitName, UtcTimestamp};

/// Stable identity of one deployed snapshot.
///
/// The identifier component is derived from the deployed recipe's
/// fingerprint, so two deployments of identical content share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotId {
    /// The unit the snapshot binds.
    pub name: UnitName,
    /// Content-derived identifier.
    pub ident: String,
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.ident)
    }
}

/// What kind of entity a snapshot binds.
///
/// Environments can carry non-transformation artifacts (standalone
/// validation checks); those are discarded when building the remote
/// registry for a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotKind {
    /// A transformable unit; participates in resolution.
    Unit,
    /// A standalone validation check; excluded from resolution.
    StandaloneCheck,
}

/// An immutable, versioned record of one deployed recipe.
///
/// # Example
///
/// ```
/// use meshwork::core::naming::{normalize, Dialect};
/// use meshwork::core::recipe::Recipe;
/// use meshwork::core::snapshot::{Snapshot, SnapshotKind};
///
/// let name = normalize("db.orders", None, Dialect::Ansi).unwrap();
/// let snapshot = Snapshot::new(Recipe::new(name, "SELECT 1 AS a"), SnapshotKind::Unit);
///
/// // Identity is stable for identical content
/// let again = Snapshot::new(snapshot.recipe.clone(), SnapshotKind::Unit);
/// assert_eq!(snapshot.id, again.id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stable snapshot identity.
    pub id: SnapshotId,
    /// What the snapshot binds.
    pub kind: SnapshotKind,
    /// The deployed recipe, exactly as it was resolved at deployment time.
    pub recipe: Recipe,
}

impl Snapshot {
    /// Identifier length taken from the recipe fingerprint.
    const IDENT_LEN: usize = 12;

    /// Create a snapshot of a recipe, deriving its identity from the
    /// recipe's current fingerprint.
    pub fn new(recipe: Recipe, kind: SnapshotKind) -> Self {
        let fingerprint = recipe.fingerprint();
        let ident = fingerprint.as_str()[..Self::IDENT_LEN].to_string();
        Self {
            id: SnapshotId {
                name: recipe.name.clone(),
                ident,
            },
            kind,
            recipe,
        }
    }
}

/// A named, mutable pointer to a set of deployed snapshots.
///
/// One snapshot per deployed unit name at a point in time, plus a creation
/// window and an optional expiration instant.
///
/// # Example
///
/// ```
/// use meshwork::core::snapshot::Environment;
/// use meshwork::core::types::UtcTimestamp;
///
/// let env = Environment::new(
///     "dev",
///     vec![],
///     UtcTimestamp::from_rfc3339("2023-01-01T00:00:00Z").unwrap(),
///     UtcTimestamp::from_rfc3339("2023-02-01T00:00:00Z").unwrap(),
/// );
/// assert!(!env.is_expired(&UtcTimestamp::now()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Environment name.
    pub name: String,
    /// The deployed snapshot set.
    pub snapshots: Vec<SnapshotId>,
    /// Start of the creation window.
    pub start_at: UtcTimestamp,
    /// End of the creation window.
    pub end_at: UtcTimestamp,
    /// When set, the environment stops being usable at this instant.
    pub expiration: Option<UtcTimestamp>,
}

impl Environment {
    /// Create an environment with no expiration.
    pub fn new(
        name: impl Into<String>,
        snapshots: Vec<SnapshotId>,
        start_at: UtcTimestamp,
        end_at: UtcTimestamp,
    ) -> Self {
        Self {
            name: name.into(),
            snapshots,
            start_at,
            end_at,
            expiration: None,
        }
    }

    /// Set the expiration instant.
    pub fn with_expiration(mut self, expiration: UtcTimestamp) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Whether the environment is expired at `now`.
    ///
    /// An expiration instant at or before `now` counts as expired; an
    /// expired environment must not be used as a source of deployed state.
    pub fn is_expired(&self, now: &UtcTimestamp) -> bool {
        self.expiration.as_ref().is_some_and(|e| e <= now)
    }
}
