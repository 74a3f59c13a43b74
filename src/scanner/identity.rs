//! Resolved directory identity for cycle-free traversal.
//!
//! # Overview
//!
//! When symlinks are followed, the same directory can be reached through
//! several paths, and a link pointing at an ancestor creates a cycle.
//! [`VisitedDirs`] remembers every directory by its resolved identity so
//! each one is entered at most once, across all scan roots.
//!
//! # Platform Support
//!
//! - **Unix**: (device_id, inode) pairs from directory metadata
//! - **Other**: the canonicalized path
//!
//! # Example
//!
//! ```no_run
//! use dirdupe::scanner::identity::VisitedDirs;
//! use std::path::Path;
//!
//! let mut visited = VisitedDirs::new();
//! let dir = Path::new("/some/dir");
//! let meta = std::fs::metadata(dir).unwrap();
//!
//! assert!(visited.first_visit(dir, &meta));
//! assert!(!visited.first_visit(dir, &meta));
//! ```

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Tracks directories that have already been entered.
///
/// NOT thread-safe; the walker owns one per scan.
#[derive(Debug, Default)]
pub struct VisitedDirs {
    seen: HashSet<DirKey>,
}

impl VisitedDirs {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Record a directory and report whether this is its first visit.
    ///
    /// `metadata` must describe the resolved directory (i.e. come from
    /// `fs::metadata`, not `symlink_metadata`, when links are followed).
    /// If no identity can be derived the directory is treated as new.
    pub fn first_visit(&mut self, path: &Path, metadata: &Metadata) -> bool {
        match DirKey::resolve(path, metadata) {
            Some(key) => self.seen.insert(key),
            None => true,
        }
    }

    /// Number of distinct directories recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Platform-specific directory identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DirKey {
    #[cfg(unix)]
    Inode { dev: u64, ino: u64 },
    #[cfg_attr(unix, allow(dead_code))]
    Canonical(PathBuf),
}

impl DirKey {
    #[cfg(unix)]
    fn resolve(_path: &Path, metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self::Inode {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn resolve(path: &Path, _metadata: &Metadata) -> Option<Self> {
        std::fs::canonicalize(path).ok().map(Self::Canonical)
    }
}
