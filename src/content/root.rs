//! Content root resolution
//!
//! Request paths arrive pre-validated by the router, but resolution
//! never relies on that alone: every path is joined onto the
//! canonicalized base and bound-checked before any read or write.

use std::path::{Component, Path, PathBuf};

use crate::content::ContentError;

/// The directory all content files live under, canonicalized once at
/// startup.
#[derive(Debug, Clone)]
pub struct ContentRoot {
    base: PathBuf,
}

impl ContentRoot {
    /// Open the content root, creating the directory if it is missing,
    /// and canonicalize it.
    pub fn open(dir: &Path) -> Result<Self, ContentError> {
        std::fs::create_dir_all(dir)?;
        let base = dir.canonicalize()?;
        Ok(Self { base })
    }

    /// The canonicalized base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a relative path to an absolute path under the root.
    ///
    /// Rejects absolute paths and any non-normal component (`..`, `.`,
    /// prefixes), then verifies the nearest existing ancestor of the
    /// joined path still canonicalizes under the base. The target
    /// itself may not exist yet; saves of new pages resolve here too.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ContentError> {
        let rel = Path::new(relative);
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(ContentError::OutsideRoot(relative.to_string()));
        }

        let full = self.base.join(rel);
        let canonical = nearest_existing_ancestor(&full).canonicalize()?;
        if !canonical.starts_with(&self.base) {
            return Err(ContentError::OutsideRoot(relative.to_string()));
        }
        Ok(full)
    }
}

/// Walk up from `path` to the closest ancestor that exists on disk.
/// The base directory always exists, so the walk terminates there.
fn nearest_existing_ancestor(path: &Path) -> &Path {
    let mut current = path;
    while !current.exists() {
        match current.parent() {
            Some(parent) => current = parent,
            None => return path,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = ContentRoot::open(dir.path()).unwrap();

        let resolved = root.resolve("notes/todo.md").unwrap();
        assert!(resolved.starts_with(root.base()));
        assert!(resolved.ends_with("notes/todo.md"));
    }

    #[test]
    fn test_resolve_empty_path_is_base() {
        let dir = tempfile::tempdir().unwrap();
        let root = ContentRoot::open(dir.path()).unwrap();

        assert_eq!(root.resolve("").unwrap(), root.base());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let root = ContentRoot::open(dir.path()).unwrap();

        assert!(matches!(
            root.resolve("../outside.txt"),
            Err(ContentError::OutsideRoot(_))
        ));
        assert!(matches!(
            root.resolve("a/../../outside.txt"),
            Err(ContentError::OutsideRoot(_))
        ));
        assert!(matches!(
            root.resolve("/etc/passwd"),
            Err(ContentError::OutsideRoot(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let root = ContentRoot::open(dir.path()).unwrap();

        std::os::unix::fs::symlink(outside.path(), root.base().join("link")).unwrap();
        assert!(matches!(
            root.resolve("link/page.txt"),
            Err(ContentError::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("content");

        let root = ContentRoot::open(&nested).unwrap();
        assert!(root.base().is_dir());
    }
}
