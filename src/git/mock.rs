//! git::mock
//!
//! Mock Git client for deterministic testing.
//!
//! # Design
//!
//! The mock returns configured change sets and records how many times each
//! listing was fetched, so tests can verify the engine's once-per-expansion
//! memoization boundary.
//!
//! # Example
//!
//! ```
//! use meshwork::git::{GitClient, MockGitClient};
//! use std::path::PathBuf;
//!
//! let git = MockGitClient::new()
//!     .with_committed_changes([PathBuf::from("/models/orders.sql")]);
//!
//! let changed = git.list_committed_changed_files("main").unwrap();
//! assert_eq!(changed, vec![PathBuf::from("/models/orders.sql")]);
//! assert_eq!(git.committed_calls(), 1);
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::{GitClient, GitError};

/// Mock Git client for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockGitClient {
    inner: Arc<Mutex<MockGitInner>>,
}

#[derive(Debug, Default)]
struct MockGitInner {
    untracked: Vec<PathBuf>,
    uncommitted: Vec<PathBuf>,
    committed: Vec<PathBuf>,
    untracked_calls: usize,
    uncommitted_calls: usize,
    committed_calls: usize,
    requested_branches: Vec<String>,
}

impl MockGitClient {
    /// Create a mock with empty change sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the untracked-file listing.
    pub fn with_untracked(self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.inner.lock().unwrap().untracked = files.into_iter().collect();
        self
    }

    /// Configure the uncommitted-change listing.
    pub fn with_uncommitted_changes(self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.inner.lock().unwrap().uncommitted = files.into_iter().collect();
        self
    }

    /// Configure the committed-diff listing (returned for any branch).
    pub fn with_committed_changes(self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.inner.lock().unwrap().committed = files.into_iter().collect();
        self
    }

    /// How many times the untracked listing was fetched.
    pub fn untracked_calls(&self) -> usize {
        self.inner.lock().unwrap().untracked_calls
    }

    /// How many times the uncommitted listing was fetched.
    pub fn uncommitted_calls(&self) -> usize {
        self.inner.lock().unwrap().uncommitted_calls
    }

    /// How many times the committed listing was fetched.
    pub fn committed_calls(&self) -> usize {
        self.inner.lock().unwrap().committed_calls
    }

    /// The target branches requested from the committed listing, in order.
    pub fn requested_branches(&self) -> Vec<String> {
        self.inner.lock().unwrap().requested_branches.clone()
    }
}

impl GitClient for MockGitClient {
    fn list_untracked_files(&self) -> Result<Vec<PathBuf>, GitError> {
        let mut inner = self.inner.lock().unwrap();
        inner.untracked_calls += 1;
        Ok(inner.untracked.clone())
    }

    fn list_uncommitted_changed_files(&self) -> Result<Vec<PathBuf>, GitError> {
        let mut inner = self.inner.lock().unwrap();
        inner.uncommitted_calls += 1;
        Ok(inner.uncommitted.clone())
    }

    fn list_committed_changed_files(
        &self,
        target_branch: &str,
    ) -> Result<Vec<PathBuf>, GitError> {
        let mut inner = self.inner.lock().unwrap();
        inner.committed_calls += 1;
        inner.requested_branches.push(target_branch.to_string());
        Ok(inner.committed.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_and_branches() {
        let git = MockGitClient::new();
        git.list_untracked_files().unwrap();
        git.list_committed_changed_files("main").unwrap();
        git.list_committed_changed_files("release").unwrap();

        assert_eq!(git.untracked_calls(), 1);
        assert_eq!(git.uncommitted_calls(), 0);
        assert_eq!(git.committed_calls(), 2);
        assert_eq!(git.requested_branches(), vec!["main", "release"]);
    }

    #[test]
    fn returns_configured_changes() {
        let git = MockGitClient::new()
            .with_untracked([PathBuf::from("/models/new.sql")])
            .with_uncommitted_changes([PathBuf::from("/models/edited.sql")]);

        assert_eq!(
            git.list_untracked_files().unwrap(),
            vec![PathBuf::from("/models/new.sql")]
        );
        assert_eq!(
            git.list_uncommitted_changed_files().unwrap(),
            vec![PathBuf::from("/models/edited.sql")]
        );
    }
}
