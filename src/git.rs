use std::path::{Path, PathBuf};

use git2::{Delta, DiffFindOptions, DiffOptions, Repository};
use tracing::debug;

use crate::error::{GuardError, Result};

/// Paths touched by the staged changes: added, copied, modified, renamed,
/// deleted, type-changed and unmerged entries. Renames and copies contribute
/// both the old and the new path.
///
/// Paths are repo-relative and use forward slashes. Returns an empty vec on
/// any failure (non-git directory, unreadable index, etc.).
pub fn staged_paths(repo_root: &Path) -> Vec<String> {
    match try_staged_paths(repo_root) {
        Ok(paths) => paths,
        Err(e) => {
            debug!(error = %e, "could not read staged changes");
            vec![]
        }
    }
}

fn try_staged_paths(repo_root: &Path) -> std::result::Result<Vec<String>, git2::Error> {
    let repo = Repository::discover(repo_root)?;
    // An unborn branch has no HEAD tree; everything in the index is new.
    let head_tree = match repo.head() {
        Ok(head) => Some(head.peel_to_tree()?),
        Err(_) => None,
    };
    let index = repo.index()?;

    let mut opts = DiffOptions::new();
    opts.include_typechange(true);
    let mut diff = repo.diff_tree_to_index(head_tree.as_ref(), Some(&index), Some(&mut opts))?;
    diff.find_similar(Some(DiffFindOptions::new().renames(true)))?;

    let mut paths = Vec::new();
    for delta in diff.deltas() {
        let old = delta.old_file().path().map(path_string);
        let new = delta.new_file().path().map(path_string);
        match delta.status() {
            Delta::Renamed | Delta::Copied => {
                paths.extend(old);
                paths.extend(new);
            }
            Delta::Deleted => paths.extend(old.or(new)),
            Delta::Added | Delta::Modified | Delta::Typechange | Delta::Conflicted => {
                paths.extend(new.or(old));
            }
            _ => {}
        }
    }
    Ok(paths)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// The directory git runs hooks from, honouring `core.hooksPath`.
pub fn hooks_dir(repo_root: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(repo_root)
        .map_err(|_| GuardError::NotGitRepository(repo_root.display().to_string()))?;

    if let Ok(config) = repo.config()
        && let Ok(custom) = config.get_path("core.hooksPath")
    {
        return Ok(if custom.is_absolute() {
            custom
        } else {
            repo.workdir().unwrap_or_else(|| repo.path()).join(custom)
        });
    }
    Ok(repo.path().join("hooks"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn commit_all(repo: &Repository, message: &str) {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    fn stage(repo: &Repository, rel: &str) {
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(rel)).unwrap();
        index.write().unwrap();
    }

    #[test]
    fn non_repo_yields_nothing() {
        let dir = tempdir().unwrap();
        assert!(staged_paths(dir.path()).is_empty());
    }

    #[test]
    fn unborn_branch_lists_staged_files() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("untracked.txt"), "x").unwrap();
        stage(&repo, "src/main.rs");

        assert_eq!(staged_paths(dir.path()), vec!["src/main.rs"]);
    }

    #[test]
    fn modified_and_deleted_files() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("a.txt"), "one").unwrap();
        fs::write(dir.path().join("b.txt"), "two").unwrap();
        commit_all(&repo, "init");

        fs::write(dir.path().join("a.txt"), "changed").unwrap();
        stage(&repo, "a.txt");
        let mut index = repo.index().unwrap();
        index.remove_path(Path::new("b.txt")).unwrap();
        index.write().unwrap();

        let mut paths = staged_paths(dir.path());
        paths.sort();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn renames_contribute_both_sides() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let body = "line\n".repeat(50);
        fs::write(dir.path().join("old_name.rs"), &body).unwrap();
        commit_all(&repo, "init");

        fs::rename(dir.path().join("old_name.rs"), dir.path().join("new_name.rs")).unwrap();
        let mut index = repo.index().unwrap();
        index.remove_path(Path::new("old_name.rs")).unwrap();
        index.add_path(Path::new("new_name.rs")).unwrap();
        index.write().unwrap();

        let paths = staged_paths(dir.path());
        assert!(paths.contains(&"old_name.rs".to_string()));
        assert!(paths.contains(&"new_name.rs".to_string()));
    }

    #[test]
    fn hooks_dir_defaults_inside_git_dir() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert_eq!(hooks_dir(dir.path()).unwrap(), repo.path().join("hooks"));
    }

    #[test]
    fn hooks_dir_outside_repo_errors() {
        let dir = tempdir().unwrap();
        let err = hooks_dir(dir.path()).unwrap_err();
        assert!(matches!(err, GuardError::NotGitRepository(_)));
    }
}
