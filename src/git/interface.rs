//! git::interface
//!
//! Git change-oracle implementation using git2.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants and propagated unchanged
//! to the caller; the resolution engine performs no retries and no
//! partial-result suppression.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::GitClient;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

/// Git change oracle backed by libgit2.
///
/// Paths returned by the listing methods are absolute (joined onto the
/// repository's working directory) so they compare directly against the
/// source paths recorded on recipes.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git").field("path", &self.repo.path()).finish()
    }
}

impl Git {
    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    fn statuses(&self, include_untracked: bool) -> Result<git2::Statuses<'_>, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(include_untracked)
            .recurse_untracked_dirs(include_untracked)
            .include_ignored(false);

        self.repo
            .statuses(Some(&mut opts))
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })
    }

    fn resolve_branch_tree(&self, branch: &str) -> Result<(git2::Oid, git2::Tree<'_>), GitError> {
        let refname = format!("refs/heads/{branch}");
        let reference = self
            .repo
            .find_reference(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        let commit = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, &refname))?;
        let tree = commit
            .tree()
            .map_err(|e| GitError::from_git2(e, &refname))?;
        Ok((commit.id(), tree))
    }
}

impl GitClient for Git {
    fn list_untracked_files(&self) -> Result<Vec<PathBuf>, GitError> {
        let work_dir = self.work_dir()?.to_path_buf();
        let statuses = self.statuses(true)?;

        let mut files = Vec::new();
        for entry in statuses.iter() {
            if entry.status().is_wt_new() {
                if let Some(path) = entry.path() {
                    files.push(work_dir.join(path));
                }
            }
        }
        Ok(files)
    }

    fn list_uncommitted_changed_files(&self) -> Result<Vec<PathBuf>, GitError> {
        let work_dir = self.work_dir()?.to_path_buf();
        let statuses = self.statuses(false)?;

        let mut files = BTreeSet::new();
        for entry in statuses.iter() {
            let status = entry.status();
            let changed = status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
                || status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange();
            if changed {
                if let Some(path) = entry.path() {
                    files.insert(work_dir.join(path));
                }
            }
        }
        Ok(files.into_iter().collect())
    }

    fn list_committed_changed_files(
        &self,
        target_branch: &str,
    ) -> Result<Vec<PathBuf>, GitError> {
        let work_dir = self.work_dir()?.to_path_buf();

        let head_commit = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        let head_tree = head_commit
            .tree()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let (branch_oid, branch_tree) = self.resolve_branch_tree(target_branch)?;

        // Diff against the merge base so changes committed on the target
        // branch itself do not count as local changes.
        let base_tree = match self.repo.merge_base(head_commit.id(), branch_oid) {
            Ok(base_oid) => {
                let base_commit = self
                    .repo
                    .find_commit(base_oid)
                    .map_err(|e| GitError::from_git2(e, "merge base"))?;
                base_commit
                    .tree()
                    .map_err(|e| GitError::from_git2(e, "merge base"))?
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => branch_tree,
            Err(e) => return Err(GitError::from_git2(e, "merge base")),
        };

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)
            .map_err(|e| GitError::from_git2(e, "diff"))?;

        let mut files = BTreeSet::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    files.insert(work_dir.join(path));
                }
            }
        }
        Ok(files.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = GitError::NotARepo {
            path: PathBuf::from("/tmp/nowhere"),
        };
        assert!(err.to_string().contains("/tmp/nowhere"));

        let err = GitError::RefNotFound {
            refname: "refs/heads/main".to_string(),
        };
        assert!(err.to_string().contains("refs/heads/main"));
    }

    #[test]
    fn open_fails_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        let result = Git::open(dir.path());
        assert!(matches!(result, Err(GitError::NotARepo { .. })));
    }
}
