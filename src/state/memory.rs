//! state::memory
//!
//! In-memory state store for deterministic testing.
//!
//! # Example
//!
//! ```
//! use meshwork::core::naming::{normalize, Dialect};
//! use meshwork::core::recipe::Recipe;
//! use meshwork::core::snapshot::{Environment, Snapshot, SnapshotKind};
//! use meshwork::core::types::UtcTimestamp;
//! use meshwork::state::{MemoryStateReader, StateReader};
//!
//! let name = normalize("db.orders", None, Dialect::Ansi).unwrap();
//! let snapshot = Snapshot::new(Recipe::new(name, "SELECT 1 AS a"), SnapshotKind::Unit);
//!
//! let state = MemoryStateReader::new();
//! state.put_environment(Environment::new(
//!     "dev",
//!     vec![snapshot.id.clone()],
//!     UtcTimestamp::from_rfc3339("2023-01-01T00:00:00Z").unwrap(),
//!     UtcTimestamp::from_rfc3339("2023-02-01T00:00:00Z").unwrap(),
//! ));
//! state.put_snapshot(snapshot);
//!
//! assert!(state.get_environment("dev").unwrap().is_some());
//! assert!(state.get_environment("missing").unwrap().is_none());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{StateError, StateReader};
use crate::core::snapshot::{Environment, Snapshot, SnapshotId};

/// In-memory environment/snapshot store.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping. Also records which
/// environment names were requested, so tests can assert lookup and
/// fallback order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateReader {
    inner: Arc<Mutex<MemoryStateInner>>,
}

#[derive(Debug, Default)]
struct MemoryStateInner {
    environments: HashMap<String, Environment>,
    snapshots: HashMap<SnapshotId, Snapshot>,
    environment_requests: Vec<String>,
}

impl MemoryStateReader {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an environment under its own name, replacing any previous one.
    pub fn put_environment(&self, environment: Environment) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .environments
            .insert(environment.name.clone(), environment);
    }

    /// Store a snapshot under its own id.
    pub fn put_snapshot(&self, snapshot: Snapshot) {
        let mut inner = self.inner.lock().unwrap();
        inner.snapshots.insert(snapshot.id.clone(), snapshot);
    }

    /// The environment names requested so far, in call order.
    pub fn environment_requests(&self) -> Vec<String> {
        self.inner.lock().unwrap().environment_requests.clone()
    }
}

impl StateReader for MemoryStateReader {
    fn get_environment(&self, name: &str) -> Result<Option<Environment>, StateError> {
        let mut inner = self.inner.lock().unwrap();
        inner.environment_requests.push(name.to_string());
        Ok(inner.environments.get(name).cloned())
    }

    fn get_snapshots(
        &self,
        ids: &[SnapshotId],
    ) -> Result<HashMap<SnapshotId, Snapshot>, StateError> {
        let inner = self.inner.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| inner.snapshots.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::{normalize, Dialect};
    use crate::core::recipe::Recipe;
    use crate::core::snapshot::SnapshotKind;
    use crate::core::types::UtcTimestamp;

    fn environment(name: &str, snapshots: Vec<SnapshotId>) -> Environment {
        Environment::new(
            name,
            snapshots,
            UtcTimestamp::from_rfc3339("2023-01-01T00:00:00Z").unwrap(),
            UtcTimestamp::from_rfc3339("2023-02-01T00:00:00Z").unwrap(),
        )
    }

    #[test]
    fn missing_environment_is_none() {
        let state = MemoryStateReader::new();
        assert!(state.get_environment("missing").unwrap().is_none());
        assert_eq!(state.environment_requests(), vec!["missing"]);
    }

    #[test]
    fn unknown_snapshot_ids_are_absent() {
        let name = normalize("db.a", None, Dialect::Ansi).unwrap();
        let snapshot = Snapshot::new(Recipe::new(name, "SELECT 1"), SnapshotKind::Unit);
        let unknown = SnapshotId {
            name: snapshot.id.name.clone(),
            ident: "000000000000".to_string(),
        };

        let state = MemoryStateReader::new();
        state.put_snapshot(snapshot.clone());

        let found = state
            .get_snapshots(&[snapshot.id.clone(), unknown.clone()])
            .unwrap();
        assert!(found.contains_key(&snapshot.id));
        assert!(!found.contains_key(&unknown));
    }

    #[test]
    fn environments_replace_by_name() {
        let state = MemoryStateReader::new();
        state.put_environment(environment("dev", vec![]));
        state.put_environment(environment("dev", vec![]));
        assert!(state.get_environment("dev").unwrap().is_some());
    }
}
