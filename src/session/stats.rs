//! Memoized per-directory statistics.
//!
//! The three caches only memoize values derived from the current index.
//! They are unbounded and are cleared wholesale on every scan, or per path
//! after a trash or undo.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::duplicates::{calculate_redundancy_score, DirStats};

/// A plain memoization map keyed by directory path.
#[derive(Debug, Clone)]
pub struct StatsCache<V> {
    entries: HashMap<PathBuf, V>,
}

impl<V> Default for StatsCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> StatsCache<V> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized value for `key`.
    #[must_use]
    pub fn get(&self, key: &Path) -> Option<&V> {
        self.entries.get(key)
    }

    /// Store a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<PathBuf>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    /// Whether `key` is memoized.
    #[must_use]
    pub fn contains(&self, key: &Path) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of memoized entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is memoized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries for `dir`, its ancestors and its descendants.
    ///
    /// Returns how many entries were removed.
    pub fn invalidate_related(&mut self, dir: &Path) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| !(key.starts_with(dir) || dir.starts_with(key)));
        before - self.entries.len()
    }
}

/// Aggregate statistics for a directory and everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RecursiveStats {
    /// Files in the whole subtree
    pub file_count: usize,
    /// Files in the subtree whose content exists at least twice
    pub duplicate_count: usize,
    /// Directories below this one
    pub dir_count: usize,
    /// `duplicate_count / file_count`
    pub redundancy_score: f64,
}

impl RecursiveStats {
    /// Stats of a single directory with no children counted yet.
    #[must_use]
    pub fn from_immediate(stats: &DirStats) -> Self {
        Self {
            file_count: stats.file_count,
            duplicate_count: stats.duplicate_count,
            dir_count: 0,
            redundancy_score: stats.redundancy_score,
        }
    }

    /// Fold a child subtree into this one.
    pub fn absorb(&mut self, child: &RecursiveStats) {
        self.file_count += child.file_count;
        self.duplicate_count += child.duplicate_count;
        self.dir_count += child.dir_count + 1;
        self.redundancy_score = calculate_redundancy_score(self.duplicate_count, self.file_count);
    }

    /// View as plain [`DirStats`].
    #[must_use]
    pub fn as_dir_stats(&self) -> DirStats {
        DirStats::new(self.file_count, self.duplicate_count)
    }
}

/// Immediate children of a directory, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirContents {
    /// Indexed subdirectories
    pub subdirs: Vec<PathBuf>,
    /// Files directly inside
    pub files: Vec<PathBuf>,
}

/// The session's three derived-statistic caches.
#[derive(Debug, Clone, Default)]
pub struct DerivedCaches {
    /// Subtree aggregates
    pub recursive_stats: StatsCache<RecursiveStats>,
    /// Sorted directory listings
    pub dir_contents: StatsCache<DirContents>,
    /// Subtree sizes in bytes
    pub dir_sizes: StatsCache<u64>,
}

impl DerivedCaches {
    /// Clear all three caches.
    pub fn clear(&mut self) {
        self.recursive_stats.clear();
        self.dir_contents.clear();
        self.dir_sizes.clear();
    }

    /// Targeted invalidation in all three caches.
    pub fn invalidate_related(&mut self, dir: &Path) -> usize {
        self.recursive_stats.invalidate_related(dir)
            + self.dir_contents.invalidate_related(dir)
            + self.dir_sizes.invalidate_related(dir)
    }

    /// Whether all three caches are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recursive_stats.is_empty() && self.dir_contents.is_empty() && self.dir_sizes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_arbitrary_keys_then_clear() {
        let mut caches = DerivedCaches::default();
        caches.recursive_stats.insert("test", RecursiveStats::default());
        caches.dir_contents.insert("test", DirContents::default());
        caches.dir_sizes.insert("test", 7);
        assert!(!caches.is_empty());

        caches.clear();
        assert_eq!(caches.recursive_stats.len(), 0);
        assert_eq!(caches.dir_contents.len(), 0);
        assert_eq!(caches.dir_sizes.len(), 0);
    }

    #[test]
    fn test_invalidate_related_hits_ancestors_and_descendants() {
        let mut cache = StatsCache::new();
        for key in ["/r", "/r/a", "/r/a/b", "/r/c", "/other"] {
            cache.insert(key, 1u64);
        }

        assert_eq!(cache.invalidate_related(Path::new("/r/a")), 3);
        assert!(cache.contains(Path::new("/r/c")));
        assert!(cache.contains(Path::new("/other")));
        assert!(!cache.contains(Path::new("/r")));
    }

    #[test]
    fn test_invalidate_is_component_wise() {
        let mut cache = StatsCache::new();
        cache.insert("/r/ab", 1u64);
        assert_eq!(cache.invalidate_related(Path::new("/r/a")), 0);
    }

    #[test]
    fn test_recursive_stats_absorb() {
        let mut parent = RecursiveStats::from_immediate(&DirStats::new(2, 0));
        let child = RecursiveStats::from_immediate(&DirStats::new(2, 2));
        parent.absorb(&child);

        assert_eq!(parent.file_count, 4);
        assert_eq!(parent.duplicate_count, 2);
        assert_eq!(parent.dir_count, 1);
        assert_eq!(parent.redundancy_score, 0.5);
    }
}
