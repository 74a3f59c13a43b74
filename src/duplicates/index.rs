//! Aggregation of fingerprints into cross-directory duplicate indexes.
//!
//! # Overview
//!
//! [`build_index`] is a pure function: it takes `(FileEntry, Hash)` pairs
//! and the set of visited directories and produces a [`DuplicateIndex`].
//! Every structure is a map or a set, so the result does not depend on the
//! order in which hashing workers finished.
//!
//! # Example
//!
//! ```
//! use dirdupe::duplicates::{build_index, calculate_redundancy_score};
//! use dirdupe::scanner::{FileEntry, Hasher};
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let now = SystemTime::now();
//! let same = Hasher::hash_bytes(b"same");
//! let fingerprints = vec![
//!     (FileEntry::new(PathBuf::from("/a/x"), 4, now), same),
//!     (FileEntry::new(PathBuf::from("/b/y"), 4, now), same),
//! ];
//! let index = build_index(fingerprints, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
//!
//! assert_eq!(index.total_files, 2);
//! assert_eq!(index.total_duplicates, 2);
//! assert_eq!(index.hash_to_dirs[&same].len(), 2);
//! assert_eq!(calculate_redundancy_score(1, 2), 0.5);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::finder::ScanSummary;
use crate::scanner::{FileEntry, Hash};

/// Fraction of a directory's files that have a copy somewhere in the scan.
///
/// Returns `0.0` for an empty directory. The result is clamped to `[0, 1]`.
#[must_use]
pub fn calculate_redundancy_score(duplicate_count: usize, total_count: usize) -> f64 {
    if total_count == 0 {
        return 0.0;
    }
    (duplicate_count as f64 / total_count as f64).clamp(0.0, 1.0)
}

/// Statistics over the immediate files of one directory.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DirStats {
    /// Files directly inside the directory
    pub file_count: usize,
    /// How many of those have at least one copy elsewhere
    pub duplicate_count: usize,
    /// `duplicate_count / file_count`, or 0 when empty
    pub redundancy_score: f64,
}

impl DirStats {
    /// Build stats from raw counts.
    #[must_use]
    pub fn new(file_count: usize, duplicate_count: usize) -> Self {
        Self {
            file_count,
            duplicate_count,
            redundancy_score: calculate_redundancy_score(duplicate_count, file_count),
        }
    }
}

/// A set of files with identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Shared content hash
    #[serde(serialize_with = "serialize_hash")]
    pub hash: Hash,
    /// Member files, sorted
    pub files: Vec<PathBuf>,
}

fn serialize_hash<S: serde::Serializer>(hash: &Hash, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&crate::scanner::hash_to_hex(hash))
}

/// The result of a scan: cross-referenced duplicate indexes.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    /// Per-directory statistics over immediate files
    pub dir_stats: HashMap<PathBuf, DirStats>,
    /// Files whose hash occurs at least twice
    pub total_duplicates: usize,
    /// Every file that was fingerprinted
    pub total_files: usize,
    /// Path to hash, for duplicated files only
    pub file_to_hash: HashMap<PathBuf, Hash>,
    /// Duplicated hash to the directories holding a copy
    pub hash_to_dirs: HashMap<Hash, HashSet<PathBuf>>,
    /// Every visited directory to the files directly inside it
    pub dir_all_files: HashMap<PathBuf, HashSet<PathBuf>>,
    /// Diagnostics from the scan that produced this index
    pub summary: ScanSummary,
}

/// Aggregate fingerprints into a [`DuplicateIndex`].
///
/// `directories` lists every directory the walk entered so that directories
/// without files still appear in `dir_all_files` and `dir_stats`. Parents of
/// fingerprinted files are added even if missing from `directories`.
#[must_use]
pub fn build_index<F, D>(fingerprints: F, directories: D) -> DuplicateIndex
where
    F: IntoIterator<Item = (FileEntry, Hash)>,
    D: IntoIterator<Item = PathBuf>,
{
    let mut dir_all_files: HashMap<PathBuf, HashSet<PathBuf>> = directories
        .into_iter()
        .map(|dir| (dir, HashSet::new()))
        .collect();
    let mut by_hash: HashMap<Hash, Vec<(PathBuf, PathBuf)>> = HashMap::new();

    for (entry, hash) in fingerprints {
        let FileEntry { path, parent, .. } = entry;
        dir_all_files
            .entry(parent.clone())
            .or_default()
            .insert(path.clone());
        by_hash.entry(hash).or_default().push((path, parent));
    }

    // A path reported twice (e.g. overlapping roots without dedup) counts once.
    let total_files: usize = dir_all_files.values().map(HashSet::len).sum();

    let mut file_to_hash = HashMap::new();
    let mut hash_to_dirs: HashMap<Hash, HashSet<PathBuf>> = HashMap::new();

    for (hash, mut members) in by_hash {
        members.sort_unstable();
        members.dedup();
        if members.len() < 2 {
            continue;
        }
        let dirs = hash_to_dirs.entry(hash).or_default();
        for (path, parent) in members {
            file_to_hash.insert(path, hash);
            dirs.insert(parent);
        }
    }

    let total_duplicates = file_to_hash.len();

    let dir_stats = dir_all_files
        .iter()
        .map(|(dir, files)| {
            let duplicates = files.iter().filter(|f| file_to_hash.contains_key(*f)).count();
            (dir.clone(), DirStats::new(files.len(), duplicates))
        })
        .collect();

    log::debug!(
        "Index built: {} files, {} duplicates, {} duplicate hashes, {} directories",
        total_files,
        total_duplicates,
        hash_to_dirs.len(),
        dir_all_files.len()
    );

    DuplicateIndex {
        dir_stats,
        total_duplicates,
        total_files,
        file_to_hash,
        hash_to_dirs,
        dir_all_files,
        summary: ScanSummary::default(),
    }
}

impl DuplicateIndex {
    /// Attach scan diagnostics.
    #[must_use]
    pub fn with_summary(mut self, summary: ScanSummary) -> Self {
        self.summary = summary;
        self
    }

    /// Whether the index holds nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dir_all_files.is_empty()
    }

    /// Every indexed file with content `hash`.
    ///
    /// Only duplicated hashes are indexed; any other hash yields nothing.
    #[must_use]
    pub fn files_with_hash(&self, hash: &Hash) -> Vec<PathBuf> {
        let Some(dirs) = self.hash_to_dirs.get(hash) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = dirs
            .iter()
            .filter_map(|dir| self.dir_all_files.get(dir))
            .flatten()
            .filter(|f| self.file_to_hash.get(*f) == Some(hash))
            .cloned()
            .collect();
        files.sort();
        files
    }

    /// How many indexed files have content `hash`.
    #[must_use]
    pub fn occurrences(&self, hash: &Hash) -> usize {
        self.files_with_hash(hash).len()
    }

    /// Other files with the same content as `path`, sorted.
    #[must_use]
    pub fn duplicates_of(&self, path: &Path) -> Vec<PathBuf> {
        match self.file_to_hash.get(path) {
            Some(hash) => self
                .files_with_hash(hash)
                .into_iter()
                .filter(|f| f != path)
                .collect(),
            None => Vec::new(),
        }
    }

    /// All duplicate sets, largest first, then by first member.
    #[must_use]
    pub fn duplicate_groups(&self) -> Vec<DuplicateGroup> {
        let mut groups: HashMap<Hash, Vec<PathBuf>> = HashMap::new();
        for (path, hash) in &self.file_to_hash {
            groups.entry(*hash).or_default().push(path.clone());
        }

        let mut groups: Vec<DuplicateGroup> = groups
            .into_iter()
            .map(|(hash, mut files)| {
                files.sort();
                DuplicateGroup { hash, files }
            })
            .collect();
        groups.sort_by(|a, b| {
            b.files
                .len()
                .cmp(&a.files.len())
                .then_with(|| a.files.cmp(&b.files))
        });
        groups
    }

    /// Directories sorted by redundancy score (highest first), then by path.
    ///
    /// Directories with no files are left out.
    #[must_use]
    pub fn directories_by_redundancy(&self) -> Vec<(PathBuf, DirStats)> {
        let mut dirs: Vec<(PathBuf, DirStats)> = self
            .dir_stats
            .iter()
            .filter(|(_, stats)| stats.file_count > 0)
            .map(|(dir, stats)| (dir.clone(), *stats))
            .collect();
        dirs.sort_by(|(pa, a), (pb, b)| {
            b.redundancy_score
                .total_cmp(&a.redundancy_score)
                .then_with(|| pa.cmp(pb))
        });
        dirs
    }
}
