//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one or more
//! root directories and reporting every directory and regular file found.
//! Directories are reported too, because the index needs to know about
//! directories that hold no files at all.
//!
//! # Features
//!
//! - Multiple roots walked with one shared visited-directory tracker
//! - Optional symlink following with cycle detection by resolved identity
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Size filtering (min/max)
//! - Hidden file filtering
//! - Excluded paths (the trash holding area never shows up in a scan)
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dirdupe::scanner::{WalkEntry, Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(vec![PathBuf::from("/home/user/Downloads")], config);
//! let files = walker
//!     .walk()
//!     .filter_map(Result::ok)
//!     .filter(|e| matches!(e, WalkEntry::File(_)))
//!     .count();
//! println!("Found {} files", files);
//! ```

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::identity::VisitedDirs;
use super::{FileEntry, ScanError, WalkerConfig};

/// One item produced by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    /// A directory that was entered (roots included).
    Directory(PathBuf),
    /// A regular file that passed all filters.
    File(FileEntry),
}

/// Directory walker for file discovery.
///
/// Entries are yielded in a stable order (roots in the given order,
/// children sorted by file name).
#[derive(Debug)]
pub struct Walker {
    /// Root paths to walk
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker over the given roots.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self {
            roots,
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Roots this walker was created with.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from config patterns and the root's .gitignore.
    fn build_gitignore(&self, root: &Path) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(root);

        let gitignore_path = root.join(".gitignore");
        if gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check if a path should be ignored based on configured patterns.
    fn should_ignore(
        &self,
        root: &Path,
        path: &Path,
        is_dir: bool,
        gitignore: Option<&Gitignore>,
    ) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };

        // Gitignore matching expects relative paths with forward slashes.
        let relative_path = path.strip_prefix(root).unwrap_or(path);
        let path_str = relative_path.to_string_lossy();
        let normalized_path = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };

        gi.matched(normalized_path, is_dir).is_ignore()
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.config
            .exclude_paths
            .iter()
            .any(|excluded| path.starts_with(excluded))
    }

    /// Check if a file passes size filters.
    fn passes_size_filter(&self, size: u64) -> bool {
        if let Some(min) = self.config.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.config.max_size {
            if size > max {
                return false;
            }
        }
        true
    }

    /// Walk every root, yielding directories and files.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. A root that cannot be opened produces exactly one error.
    pub fn walk(&self) -> impl Iterator<Item = Result<WalkEntry, ScanError>> + '_ {
        let visited = Rc::new(RefCell::new(VisitedDirs::new()));
        self.roots
            .iter()
            .flat_map(move |root| self.walk_root(root, Rc::clone(&visited)))
    }

    fn walk_root<'a>(
        &'a self,
        root: &'a Path,
        visited: Rc<RefCell<VisitedDirs>>,
    ) -> Box<dyn Iterator<Item = Result<WalkEntry, ScanError>> + 'a> {
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                log::warn!("Skipping root that is not a directory: {}", root.display());
                return Box::new(std::iter::once(Err(ScanError::NotADirectory(
                    root.to_path_buf(),
                ))));
            }
            Err(e) => {
                log::warn!("Cannot access root {}: {}", root.display(), e);
                return Box::new(std::iter::once(Err(ScanError::from_io(root, e))));
            }
        }

        log::debug!("Walking {}", root.display());
        let gitignore = self.build_gitignore(root);

        let entries = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                self.admit(entry, root, gitignore.as_ref(), &mut visited.borrow_mut())
            })
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |result| self.process_entry(result));

        Box::new(entries)
    }

    /// Decide whether an entry is yielded and, for directories, descended into.
    fn admit(
        &self,
        entry: &DirEntry,
        root: &Path,
        gitignore: Option<&Gitignore>,
        visited: &mut VisitedDirs,
    ) -> bool {
        let path = entry.path();
        let is_dir = entry.file_type().is_dir();

        if self.is_excluded(path) {
            log::debug!("Skipping excluded path: {}", path.display());
            return false;
        }

        if entry.depth() > 0 {
            if self.config.skip_hidden && is_hidden(entry) {
                log::trace!("Skipping hidden entry: {}", path.display());
                return false;
            }
            if self.should_ignore(root, path, is_dir, gitignore) {
                log::trace!("Ignoring: {}", path.display());
                return false;
            }
        }

        if is_dir {
            // Unreadable metadata is reported when walkdir tries to read the directory.
            if let Ok(meta) = entry.metadata() {
                if !visited.first_visit(path, &meta) {
                    log::debug!("Directory already visited, skipping: {}", path.display());
                    return false;
                }
            }
        }

        true
    }

    /// Turn a raw walkdir result into a walk entry, applying file filters.
    fn process_entry(
        &self,
        result: walkdir::Result<DirEntry>,
    ) -> Option<Result<WalkEntry, ScanError>> {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => return Some(Err(self.handle_walk_error(e))),
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            return Some(Ok(WalkEntry::Directory(entry.into_path())));
        }

        if !file_type.is_file() {
            log::trace!("Skipping non-regular entry: {}", entry.path().display());
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walk_error(e))),
        };

        let size = metadata.len();
        if !self.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                entry.path().display()
            );
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Some(Ok(WalkEntry::File(FileEntry::new(
            entry.into_path(),
            size,
            modified,
        ))))
    }

    /// Convert a walkdir error into a scan error.
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error.path().map(Path::to_path_buf).unwrap_or_default();

        if error.loop_ancestor().is_some() {
            log::warn!("Filesystem loop detected at {}", path.display());
            return ScanError::Loop(path);
        }

        let message = error.to_string();
        match error.into_io_error() {
            Some(io_error) => {
                match io_error.kind() {
                    std::io::ErrorKind::NotFound => {
                        log::debug!("Vanished during walk: {}", path.display());
                    }
                    _ => log::warn!("Walker error for {}: {}", path.display(), io_error),
                }
                ScanError::from_io(&path, io_error)
            }
            None => {
                log::warn!("Walker error for {}: {}", path.display(), message);
                ScanError::Io {
                    path,
                    source: std::io::Error::other(message),
                }
            }
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
