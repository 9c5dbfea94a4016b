//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. The resolution engine only
//! needs three read-only change-set queries, expressed by the [`GitClient`]
//! trait; no other module should import `git2`.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Listing untracked files
//! - Listing files with uncommitted modifications
//! - Listing files changed on the current line of history relative to a
//!   target branch
//!
//! # Invariants
//!
//! - All operations are read-only; the engine never mutates the repository
//! - No other module calls git2 directly
//!
//! # Example
//!
//! ```ignore
//! use meshwork::git::{Git, GitClient};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! for path in git.list_committed_changed_files("main")? {
//!     println!("changed: {}", path.display());
//! }
//! ```

mod interface;
pub mod mock;

pub use interface::{Git, GitError};
pub use mock::MockGitClient;

use std::path::PathBuf;

/// Read-only change oracle over a version-controlled source tree.
///
/// The resolution engine fetches each of these change sets at most once per
/// top-level expansion call (per target branch for the committed set) and
/// reuses them for the duration of that call.
pub trait GitClient {
    /// Files present in the working tree but unknown to version control.
    fn list_untracked_files(&self) -> Result<Vec<PathBuf>, GitError>;

    /// Tracked files with staged or unstaged modifications.
    fn list_uncommitted_changed_files(&self) -> Result<Vec<PathBuf>, GitError>;

    /// Files changed on the current line of history relative to
    /// `target_branch` (committed diff against the merge base).
    fn list_committed_changed_files(&self, target_branch: &str)
        -> Result<Vec<PathBuf>, GitError>;
}
