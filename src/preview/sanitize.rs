use std::io;
use std::path::{Path, PathBuf};

/// Canonicalized directory boundary for preview walks.
///
/// Candidates are fully resolved (symlinks included) before the containment
/// check, so neither `..` segments nor symlink hops can reach outside the
/// boundary.
#[derive(Debug, Clone)]
pub struct PathBoundary {
    root: PathBuf,
}

impl PathBoundary {
    pub fn new(root: &Path) -> io::Result<Self> {
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `candidate` and check that it stays inside the boundary.
    ///
    /// Returns the canonical path, or `None` when the candidate cannot be
    /// resolved or escapes the root. Callers treat `None` as a per-entry
    /// skip, never as a request-level failure.
    pub fn resolve(&self, candidate: &Path) -> Option<PathBuf> {
        let resolved = candidate.canonicalize().ok()?;
        resolved.starts_with(&self.root).then_some(resolved)
    }
}
