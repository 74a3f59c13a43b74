//! Duplicate finder: walk, fingerprint, aggregate.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs the scan pipeline over one or more roots:
//! 1. **Walk** - collect every directory and regular file (see [`crate::scanner::walker`])
//! 2. **Hash** - compute a BLAKE3 digest per file on a rayon pool of `jobs`
//!    threads, consulting the [`HashCache`] first when one is configured
//! 3. **Index** - aggregate with [`build_index`]
//!
//! Files or directories that vanish or cannot be read are skipped and
//! counted in the [`ScanSummary`]. The scan fails only when roots were given
//! and none of them is an accessible directory, or when it is interrupted.
//!
//! # Example
//!
//! ```no_run
//! use dirdupe::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_jobs(4));
//! let index = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//!
//! println!("{} of {} files are duplicated", index.total_duplicates, index.total_files);
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::index::{build_index, DuplicateIndex};
use crate::actions::HOLDING_AREA_NAME;
use crate::cache::{CacheEntry, HashCache};
use crate::progress::{Progress, ProgressCallback, PHASE_HASHING, PHASE_WALKING};
use crate::scanner::{FileEntry, Hash, HashError, Hasher, ScanError, WalkEntry, Walker, WalkerConfig};

/// Files above this size get a debug line when hashing starts.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Default number of hashing threads.
pub const DEFAULT_JOBS: usize = 4;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hashing threads. `1` hashes strictly sequentially.
    pub jobs: usize,
    /// Optional hash cache for faster rescans.
    pub cache: Option<Arc<HashCache>>,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("jobs", &self.jobs)
            .field("cache", &self.cache.as_ref().map(|_| "<cache>"))
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            cache: None,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads (at least 1).
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set the hash cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<HashCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Diagnostics from one scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Files fingerprinted
    pub total_files: usize,
    /// Combined size of fingerprinted files in bytes
    pub total_size: u64,
    /// Directories indexed
    pub directories: usize,
    /// Files skipped because they vanished or could not be read
    pub skipped_files: usize,
    /// Directories skipped because they could not be read
    pub skipped_dirs: usize,
    /// Hashes served from the cache
    pub cache_hits: usize,
    /// Hashes computed despite a configured cache
    pub cache_misses: usize,
    /// Files whose content exists at least twice
    pub duplicate_files: usize,
    /// Distinct duplicated contents
    pub duplicate_sets: usize,
    /// Wall time of the whole scan
    pub scan_duration: Duration,
    /// Every recoverable error encountered
    pub errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Whether anything was skipped.
    #[must_use]
    pub fn has_skipped(&self) -> bool {
        self.skipped_files > 0 || self.skipped_dirs > 0
    }

    /// Human-readable total size.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        bytesize::ByteSize::b(self.total_size).to_string()
    }
}

/// Errors that end a scan without a result.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// Roots were given but none could be walked.
    #[error("No accessible root directory among: {}", display_paths(.0))]
    NoAccessibleRoots(Vec<PathBuf>),

    /// The hashing thread pool could not be created.
    #[error("Failed to create hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of fingerprinting one file.
struct Fingerprinted {
    file: FileEntry,
    result: Result<Hash, HashError>,
    cache_hit: bool,
}

/// Orchestrates walking, hashing and indexing.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Scan `roots` and build a duplicate index.
    ///
    /// An empty `roots` slice yields an empty index.
    ///
    /// # Errors
    ///
    /// - [`FinderError::NoAccessibleRoots`] if no root could be walked
    /// - [`FinderError::Interrupted`] if the shutdown flag was raised
    /// - [`FinderError::ThreadPool`] if the worker pool cannot start
    pub fn find_duplicates(&self, roots: &[PathBuf]) -> Result<DuplicateIndex, FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        if roots.is_empty() {
            log::debug!("No roots given, returning empty index");
            summary.scan_duration = start_time.elapsed();
            return Ok(DuplicateIndex::default().with_summary(summary));
        }

        let roots: Vec<PathBuf> = roots.iter().map(|r| absolute(r)).collect();

        let (dirs, files) = self.walk(&roots, &mut summary)?;

        if !roots.iter().any(|r| dirs.contains(r)) {
            log::error!("None of the roots could be scanned: {}", display_paths(&roots));
            return Err(FinderError::NoAccessibleRoots(roots));
        }

        let fingerprints = self.hash_files(files, &mut summary)?;

        summary.total_files = fingerprints.len();
        summary.total_size = fingerprints.iter().map(|(f, _)| f.size).sum();

        let mut index = build_index(fingerprints, dirs);

        summary.directories = index.dir_all_files.len();
        summary.duplicate_files = index.total_duplicates;
        summary.duplicate_sets = index.hash_to_dirs.len();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} files in {} directories, {} duplicated ({} skipped files, {} skipped directories) in {:.2?}",
            summary.total_files,
            summary.directories,
            summary.duplicate_files,
            summary.skipped_files,
            summary.skipped_dirs,
            summary.scan_duration
        );

        index.summary = summary;
        Ok(index)
    }

    /// Walk all roots, returning visited directories and discovered files.
    fn walk(
        &self,
        roots: &[PathBuf],
        summary: &mut ScanSummary,
    ) -> Result<(HashSet<PathBuf>, Vec<FileEntry>), FinderError> {
        let mut walker = Walker::new(roots.to_vec(), self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
        }

        let mut dirs = HashSet::new();
        let mut files = Vec::new();
        let mut seen = 0usize;

        for entry in walker.walk() {
            seen += 1;
            match entry {
                Ok(WalkEntry::Directory(dir)) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(seen, dir.to_string_lossy().as_ref());
                    }
                    dirs.insert(dir);
                }
                Ok(WalkEntry::File(file)) => files.push(file),
                Err(e) => {
                    log::warn!("Skipping: {}", e);
                    // An unreadable directory was already reported as entered.
                    let is_dir = matches!(e, ScanError::Loop(_) | ScanError::NotADirectory(_))
                        || dirs.remove(e.path())
                        || roots.iter().any(|r| r == e.path());
                    if is_dir {
                        summary.skipped_dirs += 1;
                    } else {
                        summary.skipped_files += 1;
                    }
                    summary.errors.push(e);
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }

        if self.config.is_shutdown_requested() {
            log::info!("Walk interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        // Files whose directory turned out unreadable are dropped with it.
        files.retain(|f| dirs.contains(&f.parent));

        log::debug!("Walk found {} files in {} directories", files.len(), dirs.len());
        Ok((dirs, files))
    }

    /// Hash files on a dedicated pool of `jobs` threads.
    fn hash_files(
        &self,
        files: Vec<FileEntry>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<(FileEntry, Hash)>, FinderError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_HASHING, files.len());
        }
        log::info!(
            "Hashing {} files with {} thread(s)",
            files.len(),
            self.config.jobs
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()?;

        let done = AtomicUsize::new(0);
        let results: Vec<Fingerprinted> = pool.install(|| {
            files
                .into_par_iter()
                .map(|file| {
                    let outcome = self.fingerprint(file);
                    if let Some(ref callback) = self.config.progress_callback {
                        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                        callback.on_progress(n, outcome.file.path.to_string_lossy().as_ref());
                    }
                    outcome
                })
                .collect()
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_HASHING);
        }

        if self.config.is_shutdown_requested() {
            log::info!("Hashing interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        let mut fingerprints = Vec::with_capacity(results.len());
        for Fingerprinted {
            file,
            result,
            cache_hit,
        } in results
        {
            match result {
                Ok(hash) => {
                    if self.config.cache.is_some() {
                        if cache_hit {
                            summary.cache_hits += 1;
                        } else {
                            summary.cache_misses += 1;
                        }
                    }
                    fingerprints.push((file, hash));
                }
                Err(e) => {
                    log::warn!("Failed to hash {}: {}", file.path.display(), e);
                    summary.skipped_files += 1;
                    summary.errors.push(ScanError::Hash(e));
                }
            }
        }

        Ok(fingerprints)
    }

    /// Fingerprint one file, consulting and updating the cache.
    fn fingerprint(&self, file: FileEntry) -> Fingerprinted {
        if self.config.is_shutdown_requested() {
            let result = Err(HashError::Interrupted(file.path.clone()));
            return Fingerprinted {
                file,
                result,
                cache_hit: false,
            };
        }

        if let Some(ref cache) = self.config.cache {
            match cache.get(&file.path, file.size, file.modified) {
                Ok(Some(hash)) => {
                    log::trace!("Cache hit: {}", file.path.display());
                    return Fingerprinted {
                        file,
                        result: Ok(hash),
                        cache_hit: true,
                    };
                }
                Ok(None) => log::trace!("Cache miss: {}", file.path.display()),
                Err(e) => log::warn!("Cache lookup failed for {}: {}", file.path.display(), e),
            }
        }

        if file.size > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({} MB): {}",
                file.size / (1024 * 1024),
                file.path.display()
            );
        }

        let result = self.hasher.full_hash(&file.path);

        if let Ok(hash) = result {
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_item_completed(file.size);
            }
            if let Some(ref cache) = self.config.cache {
                if let Err(e) = cache.insert(&CacheEntry::from(&file), hash) {
                    log::warn!("Failed to update cache for {}: {}", file.path.display(), e);
                }
            }
        }

        Fingerprinted {
            file,
            result,
            cache_hit: false,
        }
    }
}

/// Make a root absolute without resolving symlinks, dropping `.` and `..`.
fn absolute(path: &Path) -> PathBuf {
    use std::path::Component;

    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in abs.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Open the fingerprint cache at `path`, or at the default location.
///
/// A cache that cannot be opened is logged and treated as absent.
#[must_use]
pub fn open_cache(path: Option<&Path>) -> Option<Arc<HashCache>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => crate::cache::default_cache_path()?,
    };
    match HashCache::open(&path) {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            log::warn!(
                "Hash cache at {} is unusable, hashing everything: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Scan `roots` with default walker settings.
///
/// `quiet` suppresses the progress display, `use_cache` enables the
/// fingerprint cache at its default location and `jobs` sets the number of
/// hashing threads (`1` for sequential hashing). A holding area directly
/// under any root is never scanned.
///
/// # Errors
///
/// See [`DuplicateFinder::find_duplicates`].
pub fn find_duplicates(
    roots: &[PathBuf],
    quiet: bool,
    use_cache: bool,
    jobs: usize,
) -> Result<DuplicateIndex, FinderError> {
    let walker = roots.iter().fold(WalkerConfig::default(), |walker, root| {
        walker.with_excluded_path(absolute(root).join(HOLDING_AREA_NAME))
    });
    let mut config = FinderConfig::default()
        .with_jobs(jobs)
        .with_walker_config(walker);
    if use_cache {
        if let Some(cache) = open_cache(None) {
            config = config.with_cache(cache);
        }
    }
    if !quiet {
        config = config.with_progress_callback(Arc::new(Progress::new(false)));
    }
    DuplicateFinder::new(config).find_duplicates(roots)
}
