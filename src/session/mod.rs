//! Interactive session state.
//!
//! # Overview
//!
//! A [`Session`] owns everything the interactive front end needs:
//!
//! * the root paths and the current [`DuplicateIndex`]
//! * three memoized statistic caches ([`DerivedCaches`])
//! * a view stack with per-frame selection save/restore
//! * the [`TrashManager`] and its undo stack
//!
//! All state lives in this one struct and is touched from a single thread.
//! A scan builds a fresh index off to the side and swaps it in only when it
//! completes, so a failed or interrupted rescan leaves the previous results
//! intact.
//!
//! # Example
//!
//! ```no_run
//! use dirdupe::session::{Session, View};
//! use std::path::PathBuf;
//!
//! let mut session = Session::new(vec!["/photos", "/backup"], false);
//! session.scan(true).unwrap();
//! println!("{} duplicated files", session.index().total_duplicates);
//!
//! session.push_view(View::DirDetail { dir: PathBuf::from("/photos") });
//! session.pop_view();
//! ```

pub mod stats;
pub mod view;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::actions::{default_holding_area, ActionError, ItemKind, TrashManager, TrashRecord, UndoError};
use crate::cache::HashCache;
use crate::duplicates::{
    open_cache, DuplicateFinder, DuplicateIndex, FinderConfig, FinderError, ScanSummary, DEFAULT_JOBS,
};
use crate::progress::Progress;
use crate::scanner::{Hash, Hasher, WalkerConfig};

pub use stats::{DerivedCaches, DirContents, RecursiveStats, StatsCache};
pub use view::{View, ViewFrame, ViewItem};

/// One or more scan roots.
///
/// Converts from a single path or from a collection of paths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootPaths(Vec<PathBuf>);

impl RootPaths {
    /// The roots in the order given.
    #[must_use]
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.0
    }

    /// Take ownership of the roots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PathBuf> {
        self.0
    }
}

impl From<PathBuf> for RootPaths {
    fn from(path: PathBuf) -> Self {
        Self(vec![path])
    }
}

impl From<&Path> for RootPaths {
    fn from(path: &Path) -> Self {
        Self(vec![path.to_path_buf()])
    }
}

impl From<&PathBuf> for RootPaths {
    fn from(path: &PathBuf) -> Self {
        Self(vec![path.clone()])
    }
}

impl From<&str> for RootPaths {
    fn from(path: &str) -> Self {
        Self(vec![PathBuf::from(path)])
    }
}

impl From<String> for RootPaths {
    fn from(path: String) -> Self {
        Self(vec![PathBuf::from(path)])
    }
}

impl<P: Into<PathBuf>> From<Vec<P>> for RootPaths {
    fn from(paths: Vec<P>) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

impl<P: AsRef<Path>> From<&[P]> for RootPaths {
    fn from(paths: &[P]) -> Self {
        Self(paths.iter().map(|p| p.as_ref().to_path_buf()).collect())
    }
}

impl<P: Into<PathBuf>, const N: usize> From<[P; N]> for RootPaths {
    fn from(paths: [P; N]) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

/// Settings for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hashing threads
    pub jobs: usize,
    /// Use the fingerprint cache
    pub use_cache: bool,
    /// Cache database location; the platform default when `None`
    pub cache_path: Option<PathBuf>,
    /// Walk filters
    pub walker_config: WalkerConfig,
    /// Holding area for trashed items; inside the first root when `None`
    pub trash_dir: Option<PathBuf>,
    /// Raised to abort a running scan
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            use_cache: true,
            cache_path: None,
            walker_config: WalkerConfig::default(),
            trash_dir: None,
            shutdown_flag: None,
        }
    }
}

/// Interactive session: scan results, view stack, caches and undo stack.
pub struct Session {
    root_paths: Vec<PathBuf>,
    config: SessionConfig,
    cache: Option<Arc<HashCache>>,
    index: DuplicateIndex,
    dir_children: HashMap<PathBuf, Vec<PathBuf>>,
    caches: DerivedCaches,
    view_stack: Vec<ViewFrame>,
    selected_index: usize,
    scroll_offset: usize,
    trash: TrashManager,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("root_paths", &self.root_paths)
            .field("total_files", &self.index.total_files)
            .field("view_depth", &self.view_stack.len())
            .field("trash_stack", &self.trash.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session over one or more roots with default settings.
    #[must_use]
    pub fn new(roots: impl Into<RootPaths>, use_cache: bool) -> Self {
        Self::with_config(
            roots,
            SessionConfig {
                use_cache,
                ..SessionConfig::default()
            },
        )
    }

    /// Create a session with explicit settings.
    ///
    /// Nothing is scanned until [`Session::scan`] is called.
    #[must_use]
    pub fn with_config(roots: impl Into<RootPaths>, mut config: SessionConfig) -> Self {
        let root_paths = roots.into().into_vec();

        let holding_area = match config.trash_dir.take() {
            Some(dir) => std::path::absolute(&dir).unwrap_or(dir),
            None => default_holding_area(&root_paths),
        };
        config.trash_dir = Some(holding_area.clone());
        config.walker_config = config
            .walker_config
            .with_excluded_path(holding_area.clone());

        let cache = if config.use_cache {
            open_cache(config.cache_path.as_deref())
        } else {
            None
        };

        Self {
            root_paths,
            config,
            cache,
            index: DuplicateIndex::default(),
            dir_children: HashMap::new(),
            caches: DerivedCaches::default(),
            view_stack: vec![ViewFrame::new(View::Overview)],
            selected_index: 0,
            scroll_offset: 0,
            trash: TrashManager::new(holding_area),
        }
    }

    // ------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------

    /// Scan all roots and replace the index.
    ///
    /// `quiet` suppresses the progress display. On error the previous index
    /// and caches are left untouched.
    ///
    /// # Errors
    ///
    /// Propagates [`FinderError`] from the finder.
    pub fn scan(&mut self, quiet: bool) -> Result<&ScanSummary, FinderError> {
        let mut finder_config = FinderConfig::default()
            .with_jobs(self.config.jobs)
            .with_walker_config(self.config.walker_config.clone());
        if let Some(ref cache) = self.cache {
            finder_config = finder_config.with_cache(Arc::clone(cache));
        }
        if let Some(ref flag) = self.config.shutdown_flag {
            finder_config = finder_config.with_shutdown_flag(Arc::clone(flag));
        }
        if !quiet {
            finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
        }

        let index = DuplicateFinder::new(finder_config).find_duplicates(&self.root_paths)?;
        self.install_index(index);
        Ok(&self.index.summary)
    }

    /// Rescan to pick up changes made since the last scan.
    ///
    /// # Errors
    ///
    /// See [`Session::scan`].
    pub fn rescan(&mut self) -> Result<&ScanSummary, FinderError> {
        log::debug!("Rescanning {} root(s)", self.root_paths.len());
        self.scan(true)
    }

    fn install_index(&mut self, index: DuplicateIndex) {
        let mut children: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
        for dir in index.dir_all_files.keys() {
            if let Some(parent) = dir.parent() {
                if index.dir_all_files.contains_key(parent) {
                    children
                        .entry(parent.to_path_buf())
                        .or_default()
                        .push(dir.clone());
                }
            }
        }
        for list in children.values_mut() {
            list.sort();
        }

        self.index = index;
        self.dir_children = children;
        self.invalidate_all_caches();
        self.drop_stale_views();
    }

    /// Pop frames whose subject vanished from the index.
    fn drop_stale_views(&mut self) {
        while self.view_stack.len() > 1 {
            let stale = match &self.current_view() {
                View::Overview => false,
                View::DirDetail { dir } => !self.index.dir_all_files.contains_key(dir),
                View::FileMatches { file } => !self.index.file_to_hash.contains_key(file),
            };
            if !stale {
                break;
            }
            self.pop_view();
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The scan roots.
    #[must_use]
    pub fn root_paths(&self) -> &[PathBuf] {
        &self.root_paths
    }

    /// The settings in use.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The current index.
    #[must_use]
    pub fn index(&self) -> &DuplicateIndex {
        &self.index
    }

    /// Diagnostics from the last scan.
    #[must_use]
    pub fn summary(&self) -> &ScanSummary {
        &self.index.summary
    }

    /// The derived-statistic caches.
    #[must_use]
    pub fn caches(&self) -> &DerivedCaches {
        &self.caches
    }

    /// Mutable access to the derived-statistic caches.
    pub fn caches_mut(&mut self) -> &mut DerivedCaches {
        &mut self.caches
    }

    /// Undo records, oldest first.
    #[must_use]
    pub fn trash_stack(&self) -> &[TrashRecord] {
        self.trash.stack()
    }

    /// The trash manager.
    #[must_use]
    pub fn trash_manager(&self) -> &TrashManager {
        &self.trash
    }

    // ------------------------------------------------------------------
    // Cache invalidation
    // ------------------------------------------------------------------

    /// Clear the three derived caches. The index and both stacks are kept.
    pub fn invalidate_all_caches(&mut self) {
        self.caches.clear();
    }

    /// Drop cached values for `dir`, its ancestors and its descendants.
    pub fn invalidate_path(&mut self, dir: &Path) {
        let removed = self.caches.invalidate_related(dir);
        log::trace!("Invalidated {} cache entries around {}", removed, dir.display());
    }

    fn invalidate_for_item(&mut self, path: &Path, kind: ItemKind) {
        if let Some(parent) = path.parent() {
            self.invalidate_path(parent);
        }
        if kind == ItemKind::Directory {
            self.invalidate_path(path);
        }
    }

    // ------------------------------------------------------------------
    // Derived statistics
    // ------------------------------------------------------------------

    /// Aggregate stats for `dir` and everything below it.
    pub fn recursive_stats(&mut self, dir: &Path) -> RecursiveStats {
        if let Some(stats) = self.caches.recursive_stats.get(dir) {
            return *stats;
        }

        let mut stats = self
            .index
            .dir_stats
            .get(dir)
            .map(RecursiveStats::from_immediate)
            .unwrap_or_default();
        let children = self.dir_children.get(dir).cloned().unwrap_or_default();
        for child in &children {
            let child_stats = self.recursive_stats(child);
            stats.absorb(&child_stats);
        }

        self.caches.recursive_stats.insert(dir, stats);
        stats
    }

    /// Sorted immediate subdirectories and files of `dir`.
    pub fn dir_contents(&mut self, dir: &Path) -> DirContents {
        if let Some(contents) = self.caches.dir_contents.get(dir) {
            return contents.clone();
        }

        let mut files: Vec<PathBuf> = self
            .index
            .dir_all_files
            .get(dir)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        files.sort();
        let contents = DirContents {
            subdirs: self.dir_children.get(dir).cloned().unwrap_or_default(),
            files,
        };

        self.caches.dir_contents.insert(dir, contents.clone());
        contents
    }

    /// Bytes used by files in `dir` and below. Files gone from disk count as 0.
    pub fn dir_size(&mut self, dir: &Path) -> u64 {
        if let Some(size) = self.caches.dir_sizes.get(dir) {
            return *size;
        }

        let own: u64 = self
            .index
            .dir_all_files
            .get(dir)
            .map(|files| {
                files
                    .iter()
                    .filter_map(|f| std::fs::metadata(f).ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0);
        let children = self.dir_children.get(dir).cloned().unwrap_or_default();
        let mut size = own;
        for child in &children {
            size += self.dir_size(child);
        }

        self.caches.dir_sizes.insert(dir, size);
        size
    }

    /// How many files share `path`'s content, `path` included.
    ///
    /// Unique files yield 1. A file the index has never seen is hashed and
    /// matched against the indexed duplicate sets, then against indexed
    /// unique files of the same size.
    pub fn get_file_redundancy_count(&self, path: &Path) -> usize {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        if let Some(hash) = self.index.file_to_hash.get(&path) {
            return self.index.occurrences(hash).max(1);
        }

        let indexed = path
            .parent()
            .and_then(|parent| self.index.dir_all_files.get(parent))
            .is_some_and(|files| files.contains(&path));
        if indexed {
            return 1;
        }

        let hasher = Hasher::new();
        let hash = match hasher.full_hash(&path) {
            Ok(hash) => hash,
            Err(e) => {
                log::debug!("Cannot hash {} for redundancy count: {}", path.display(), e);
                return 1;
            }
        };

        let occurrences = self.index.occurrences(&hash);
        if occurrences > 0 {
            return occurrences + 1;
        }

        let Ok(size) = std::fs::metadata(&path).map(|m| m.len()) else {
            return 1;
        };
        self.unique_matches(&hasher, &path, size, &hash) + 1
    }

    /// Count indexed unique files other than `path` whose content hashes to `hash`.
    fn unique_matches(&self, hasher: &Hasher, path: &Path, size: u64, hash: &Hash) -> usize {
        self.index
            .dir_all_files
            .values()
            .flatten()
            .filter(|file| file.as_path() != path && !self.index.file_to_hash.contains_key(*file))
            .filter(|file| std::fs::metadata(file).is_ok_and(|m| m.is_file() && m.len() == size))
            .filter(|file| hasher.full_hash(file).is_ok_and(|h| h == *hash))
            .count()
    }

    /// Whether trashing `path` should be confirmed first.
    ///
    /// Directories always need confirmation; files only when no other copy
    /// of their content exists.
    pub fn needs_confirmation(&self, path: &Path, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Directory => true,
            ItemKind::File => self.get_file_redundancy_count(path) <= 1,
        }
    }

    // ------------------------------------------------------------------
    // View stack
    // ------------------------------------------------------------------

    /// Frames from root to top.
    #[must_use]
    pub fn view_stack(&self) -> &[ViewFrame] {
        &self.view_stack
    }

    /// What the top frame shows.
    #[must_use]
    pub fn current_view(&self) -> &View {
        // The stack always holds the root frame.
        &self.view_stack[self.view_stack.len() - 1].view
    }

    /// Live selection in the top frame.
    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    /// Live scroll offset in the top frame.
    #[must_use]
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Set the live selection.
    pub fn set_selected_index(&mut self, index: usize) {
        self.selected_index = index;
    }

    /// Set the live scroll offset.
    pub fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll_offset = offset;
    }

    /// Save the current selection into the top frame and push a new frame.
    pub fn push_view(&mut self, frame: impl Into<ViewFrame>) {
        if let Some(top) = self.view_stack.last_mut() {
            top.selected_index = self.selected_index;
            top.scroll_offset = self.scroll_offset;
        }
        let frame = frame.into();
        log::debug!("Push view: {}", frame.view.title());
        self.view_stack.push(frame);
        self.selected_index = 0;
        self.scroll_offset = 0;
    }

    /// Pop the top frame and restore the selection saved in the one below.
    ///
    /// The root frame is never popped; returns `None` in that case.
    pub fn pop_view(&mut self) -> Option<ViewFrame> {
        if self.view_stack.len() <= 1 {
            return None;
        }
        let popped = self.view_stack.pop();
        if let Some(top) = self.view_stack.last() {
            self.selected_index = top.selected_index;
            self.scroll_offset = top.scroll_offset;
        }
        popped
    }

    /// Rows of the current view.
    pub fn view_items(&mut self) -> Vec<ViewItem> {
        match self.current_view().clone() {
            View::Overview => self
                .index
                .directories_by_redundancy()
                .into_iter()
                .map(|(path, stats)| ViewItem::Directory { path, stats })
                .collect(),
            View::DirDetail { dir } => {
                let contents = self.dir_contents(&dir);
                let mut items = Vec::with_capacity(contents.subdirs.len() + contents.files.len());
                for sub in contents.subdirs {
                    let stats = self.recursive_stats(&sub).as_dir_stats();
                    items.push(ViewItem::Directory { path: sub, stats });
                }
                for file in contents.files {
                    let redundancy = self.indexed_redundancy(&file);
                    items.push(ViewItem::File {
                        path: file,
                        redundancy,
                    });
                }
                items
            }
            View::FileMatches { file } => {
                let copies = match self.index.file_to_hash.get(&file) {
                    Some(hash) => self.index.files_with_hash(hash),
                    None => vec![file],
                };
                let redundancy = copies.len();
                copies
                    .into_iter()
                    .map(|path| ViewItem::File { path, redundancy })
                    .collect()
            }
        }
    }

    fn indexed_redundancy(&self, file: &Path) -> usize {
        self.index
            .file_to_hash
            .get(file)
            .map_or(1, |hash| self.index.occurrences(hash).max(1))
    }

    // ------------------------------------------------------------------
    // Selection movement
    // ------------------------------------------------------------------

    /// Move down one row in a list of `len` rows.
    pub fn select_next(&mut self, len: usize) {
        if len > 0 && self.selected_index + 1 < len {
            self.selected_index += 1;
        }
    }

    /// Move up one row.
    pub fn select_previous(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Move down a page.
    pub fn select_page_down(&mut self, len: usize, page: usize) {
        if len > 0 {
            self.selected_index = (self.selected_index + page.max(1)).min(len - 1);
        }
    }

    /// Move up a page.
    pub fn select_page_up(&mut self, page: usize) {
        self.selected_index = self.selected_index.saturating_sub(page.max(1));
    }

    /// Clamp the selection to a list of `len` rows.
    pub fn clamp_selection(&mut self, len: usize) {
        if len == 0 {
            self.selected_index = 0;
            self.scroll_offset = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    /// Adjust scrolling so the selection is inside a window of `rows` rows.
    pub fn ensure_visible(&mut self, rows: usize) {
        let rows = rows.max(1);
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + rows {
            self.scroll_offset = self.selected_index + 1 - rows;
        }
    }

    // ------------------------------------------------------------------
    // Destructive actions
    // ------------------------------------------------------------------

    /// Trash `path` and invalidate the caches that covered it.
    ///
    /// The index is left as is; call [`Session::rescan`] to refresh it.
    ///
    /// # Errors
    ///
    /// See [`TrashManager::trash_item`].
    pub fn trash_item(&mut self, path: &Path, kind: ItemKind) -> Result<TrashRecord, ActionError> {
        let record = self.trash.trash_item(path, kind)?;
        self.invalidate_for_item(&record.original_path, kind);
        Ok(record)
    }

    /// Undo the most recent trash and invalidate the affected caches.
    ///
    /// # Errors
    ///
    /// See [`TrashManager::undo_last_trash`]; the record is kept on error.
    pub fn undo_last_trash(&mut self) -> Result<Option<TrashRecord>, UndoError> {
        let restored = self.trash.undo_last_trash()?;
        if let Some(ref record) = restored {
            self.invalidate_for_item(&record.original_path, record.kind);
        }
        Ok(restored)
    }

    /// Give up on the most recent undo record.
    pub fn discard_last_trash_record(&mut self) -> Option<TrashRecord> {
        self.trash.discard_last_record()
    }

    /// Send the holding area to the system recycle bin.
    ///
    /// # Errors
    ///
    /// See [`TrashManager::empty_holding_area`].
    pub fn empty_trash(&mut self) -> Result<usize, ActionError> {
        self.trash.empty_holding_area()
    }
}
