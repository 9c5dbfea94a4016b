//! state
//!
//! Read-only interface to the environment/snapshot store.
//!
//! # Design
//!
//! The resolution engine never owns deployed state; it reads environments
//! and snapshots through the [`StateReader`] trait and treats absence as a
//! valid, silent condition. Store failures are propagated unchanged; the
//! engine performs no retries and no partial-result suppression.

pub mod memory;

pub use memory::MemoryStateReader;

use std::collections::HashMap;

use thiserror::Error;

use crate::core::snapshot::{Environment, Snapshot, SnapshotId};

/// Errors from the environment/snapshot store.
#[derive(Debug, Error)]
pub enum StateError {
    /// The store backend failed.
    #[error("state store error: {message}")]
    Backend {
        /// Description of the failure
        message: String,
    },
}

/// Read-only access to deployed environments and their snapshots.
///
/// A missing environment is `Ok(None)`, never an error. Implementations
/// must be safe for concurrent reads if resolutions run from multiple
/// threads; the engine itself never mutates the store.
pub trait StateReader {
    /// Look up an environment by name.
    fn get_environment(&self, name: &str) -> Result<Option<Environment>, StateError>;

    /// Fetch snapshots by id. Unknown ids are simply absent from the
    /// returned map.
    fn get_snapshots(
        &self,
        ids: &[SnapshotId],
    ) -> Result<HashMap<SnapshotId, Snapshot>, StateError>;
}
