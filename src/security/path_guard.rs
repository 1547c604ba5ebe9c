//! Path-traversal containment for the project root.
//!
//! # Responsibilities
//! - Join caller-controlled relative paths onto the project root
//! - Collapse `.` and `..` lexically before any file-system access
//! - Reject any result that leaves the root
//!
//! Existence is not checked here; `confines` is the second, symlink-aware
//! check applied once a file has actually been found.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// A requested path resolved outside the project root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path escapes project root: {requested}")]
pub struct PathEscape {
    pub requested: String,
}

/// Resolves request paths against a fixed root directory.
#[derive(Debug, Clone)]
pub struct PathGuard {
    /// Absolute, lexically normalized root.
    root: PathBuf,
    /// Symlink-resolved root, used to confine files that exist.
    canonical_root: PathBuf,
}

impl PathGuard {
    /// Create a guard for `root`, made absolute against the working directory.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let absolute = std::path::absolute(root.as_ref())?;
        let root = normalize(&absolute);
        let canonical_root = std::fs::canonicalize(&root).unwrap_or_else(|_| root.clone());
        Ok(Self { root, canonical_root })
    }

    /// The absolute project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `requested` beneath the root.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, PathEscape> {
        resolve(&self.root, requested)
    }

    /// Whether an already canonicalized path lies within the canonical root.
    pub fn confines(&self, canonical: &Path) -> bool {
        canonical.starts_with(&self.canonical_root)
    }
}

/// Join `requested` onto `root` and reject results outside `root`.
///
/// `root` must be absolute and normalized. A leading `/` in `requested` does
/// not reset to the file-system root; the path is always joined beneath
/// `root`. An empty `requested` resolves to `root` itself.
pub fn resolve(root: &Path, requested: &str) -> Result<PathBuf, PathEscape> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(requested).components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => resolved.push(part),
        }
    }

    // Component-wise: "/srv/site2" does not start with "/srv/site".
    if resolved.starts_with(root) {
        Ok(resolved)
    } else {
        Err(PathEscape {
            requested: requested.to_string(),
        })
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/srv/site")
    }

    #[test]
    fn joins_plain_path() {
        assert_eq!(resolve(&root(), "css/style.css").unwrap(), PathBuf::from("/srv/site/css/style.css"));
    }

    #[test]
    fn leading_slash_stays_under_root() {
        assert_eq!(resolve(&root(), "/etc/passwd").unwrap(), PathBuf::from("/srv/site/etc/passwd"));
    }

    #[test]
    fn empty_path_is_root() {
        assert_eq!(resolve(&root(), "").unwrap(), root());
    }

    #[test]
    fn collapses_dot_segments_inside_root() {
        assert_eq!(resolve(&root(), "a/./b/../c.js").unwrap(), PathBuf::from("/srv/site/a/c.js"));
        assert_eq!(resolve(&root(), "a/..").unwrap(), root());
    }

    #[test]
    fn rejects_parent_escape() {
        assert!(resolve(&root(), "../etc/passwd").is_err());
        assert!(resolve(&root(), "a/../../etc/passwd").is_err());
        assert!(resolve(&root(), "../../../../../../").is_err());
    }

    #[test]
    fn rejects_sibling_with_shared_prefix() {
        let err = resolve(&root(), "../site2/secret.txt").unwrap_err();
        assert_eq!(err.requested, "../site2/secret.txt");
    }

    #[test]
    fn guard_normalizes_relative_root() {
        let dir = tempfile::tempdir().unwrap();
        let guard = PathGuard::new(dir.path().join("sub/..")).unwrap();
        assert!(guard.root().is_absolute());
        assert!(!guard.root().ends_with(".."));
        assert!(guard.resolve("x.css").unwrap().starts_with(guard.root()));
    }

    #[test]
    fn confines_canonical_paths() {
        let dir = tempfile::tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();
        let inside = std::fs::canonicalize(dir.path()).unwrap().join("a.txt");
        assert!(guard.confines(&inside));
        assert!(!guard.confines(Path::new("/")));
    }
}
