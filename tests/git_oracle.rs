//! Change-oracle tests against real repositories.
//!
//! Each test builds a throwaway repository with git2 and checks the three
//! change listings against known working-tree and history states.

use std::fs;
use std::path::{Path, PathBuf};

use meshwork::git::{Git, GitClient, GitError};

struct TestRepo {
    // Kept alive so the directory is not deleted mid-test.
    _dir: tempfile::TempDir,
    root: PathBuf,
    repo: git2::Repository,
}

impl TestRepo {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let repo = git2::Repository::init(&root).unwrap();
        Self { _dir: dir, root, repo }
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn signature(&self) -> git2::Signature<'static> {
        git2::Signature::now("tester", "tester@example.com").unwrap()
    }

    /// Stage everything and commit to HEAD.
    fn commit_all(&self, message: &str) -> git2::Oid {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let sig = self.signature();
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    /// Create a branch pointing at a commit, without checking it out.
    fn branch_at(&self, name: &str, oid: git2::Oid) {
        let commit = self.repo.find_commit(oid).unwrap();
        self.repo.branch(name, &commit, false).unwrap();
    }

    /// Commit a one-file addition directly onto a branch ref, leaving the
    /// working tree untouched.
    fn commit_file_on_branch(&self, branch: &str, rel: &str, content: &str) {
        let refname = format!("refs/heads/{branch}");
        let parent = self
            .repo
            .find_reference(&refname)
            .unwrap()
            .peel_to_commit()
            .unwrap();

        let blob = self.repo.blob(content.as_bytes()).unwrap();
        let mut builder = self.repo.treebuilder(Some(&parent.tree().unwrap())).unwrap();
        builder.insert(rel, blob, 0o100_644).unwrap();
        let tree = self.repo.find_tree(builder.write().unwrap()).unwrap();

        let sig = self.signature();
        self.repo
            .commit(Some(&refname), &sig, &sig, "branch change", &tree, &[&parent])
            .unwrap();
    }

    fn client(&self) -> Git {
        Git::open(&self.root).unwrap()
    }
}

#[test]
fn untracked_files_are_listed_with_absolute_paths() {
    let repo = TestRepo::new();
    repo.write("models/a.sql", "SELECT 1");
    repo.commit_all("initial");

    let new_file = repo.write("models/new.sql", "SELECT 2");
    let nested = repo.write("models/staging/fresh.sql", "SELECT 3");

    let untracked = repo.client().list_untracked_files().unwrap();
    assert!(untracked.contains(&new_file));
    assert!(untracked.contains(&nested));
    assert!(untracked.iter().all(|p| p.is_absolute()));
}

#[test]
fn committed_files_are_not_untracked() {
    let repo = TestRepo::new();
    let tracked = repo.write("models/a.sql", "SELECT 1");
    repo.commit_all("initial");

    let untracked = repo.client().list_untracked_files().unwrap();
    assert!(!untracked.contains(&tracked));
}

#[test]
fn uncommitted_changes_cover_worktree_and_index() {
    let repo = TestRepo::new();
    let modified = repo.write("models/a.sql", "SELECT 1");
    let staged = repo.write("models/b.sql", "SELECT 2");
    repo.commit_all("initial");

    // Worktree-only edit.
    repo.write("models/a.sql", "SELECT 1 AS a");
    // Staged edit.
    repo.write("models/b.sql", "SELECT 2 AS b");
    let mut index = repo.repo.index().unwrap();
    index.add_path(Path::new("models/b.sql")).unwrap();
    index.write().unwrap();
    // Brand-new file: untracked, not "uncommitted".
    let untracked = repo.write("models/new.sql", "SELECT 3");

    let uncommitted = repo.client().list_uncommitted_changed_files().unwrap();
    assert!(uncommitted.contains(&modified));
    assert!(uncommitted.contains(&staged));
    assert!(!uncommitted.contains(&untracked));
}

#[test]
fn committed_diff_lists_changes_since_the_branch() {
    let repo = TestRepo::new();
    let changed = repo.write("models/a.sql", "SELECT 1");
    let untouched = repo.write("models/b.sql", "SELECT 2");
    let base = repo.commit_all("initial");
    repo.branch_at("base", base);

    repo.write("models/a.sql", "SELECT 1 AS a");
    repo.commit_all("local change");

    let committed = repo
        .client()
        .list_committed_changed_files("base")
        .unwrap();
    assert!(committed.contains(&changed));
    assert!(!committed.contains(&untouched));
}

#[test]
fn changes_on_the_target_branch_itself_do_not_count() {
    let repo = TestRepo::new();
    let local = repo.write("models/a.sql", "SELECT 1");
    let base = repo.commit_all("initial");
    repo.branch_at("other", base);

    // The target branch moved ahead on its own.
    repo.commit_file_on_branch("other", "theirs.sql", "SELECT 9");

    // And we changed something locally.
    repo.write("models/a.sql", "SELECT 1 AS a");
    repo.commit_all("local change");

    let committed = repo
        .client()
        .list_committed_changed_files("other")
        .unwrap();
    assert!(committed.contains(&local));
    assert!(!committed.contains(&repo.root.join("theirs.sql")));
}

#[test]
fn deleted_files_appear_in_the_committed_diff() {
    let repo = TestRepo::new();
    let doomed = repo.write("models/a.sql", "SELECT 1");
    repo.write("models/b.sql", "SELECT 2");
    let base = repo.commit_all("initial");
    repo.branch_at("base", base);

    fs::remove_file(&doomed).unwrap();
    let mut index = repo.repo.index().unwrap();
    index.remove_path(Path::new("models/a.sql")).unwrap();
    index.write().unwrap();
    repo.commit_all("remove a");

    let committed = repo.client().list_committed_changed_files("base").unwrap();
    assert!(committed.contains(&doomed));
}

#[test]
fn missing_branch_is_a_ref_not_found_error() {
    let repo = TestRepo::new();
    repo.write("models/a.sql", "SELECT 1");
    repo.commit_all("initial");

    let err = repo
        .client()
        .list_committed_changed_files("no_such_branch")
        .unwrap_err();
    assert!(matches!(err, GitError::RefNotFound { .. }));
}

#[test]
fn open_outside_a_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Git::open(dir.path()),
        Err(GitError::NotARepo { .. })
    ));
}
