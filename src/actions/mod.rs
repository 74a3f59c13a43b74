//! Reversible destructive actions.
//!
//! Trashing is always a move into a holding area, never an unlink:
//!
//! - [`manager`]: the [`TrashManager`] with its LIFO undo stack
//! - [`fs_move`]: rename with a copy + delete fallback across filesystems
//!
//! ```no_run
//! use dirdupe::actions::{ItemKind, TrashManager};
//! use std::path::{Path, PathBuf};
//!
//! let mut manager = TrashManager::new(PathBuf::from("/data/.dirdupe-trash"));
//! manager.trash_item(Path::new("/data/copy.txt"), ItemKind::File).unwrap();
//! manager.undo_last_trash().unwrap();
//! ```

pub mod fs_move;
pub mod manager;

use std::fmt;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use manager::{default_holding_area, TrashManager, HOLDING_AREA_NAME};

/// What kind of filesystem item an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A regular file or a symlink (moved as the link itself)
    File,
    /// A directory, moved with everything below it
    Directory,
}

impl ItemKind {
    /// Classify from `symlink_metadata`.
    #[must_use]
    pub fn of(metadata: &Metadata) -> Self {
        if metadata.is_dir() {
            Self::Directory
        } else {
            Self::File
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// One undoable trash action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashRecord {
    /// Where the item lived before it was trashed
    pub original_path: PathBuf,
    /// Where it lives now, inside the holding area
    pub trashed_location: PathBuf,
    /// File or directory
    pub kind: ItemKind,
    /// When it was trashed
    pub timestamp: DateTime<Utc>,
}

/// Error type for trash operations.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The item does not exist.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// The item cannot be moved with the current privileges.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The item is not of the requested kind.
    #[error("{path} is a {actual}, not a {expected}")]
    KindMismatch {
        /// Offending path
        path: PathBuf,
        /// Kind the caller asked for
        expected: ItemKind,
        /// Kind found on disk
        actual: ItemKind,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ActionError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::KindMismatch { path, .. } | Self::Io { path, .. } => path,
        }
    }
}

/// Why an undo could not be performed. The record is kept in every case.
#[derive(Debug, Error)]
pub enum UndoError {
    /// Something new sits where the item used to be.
    #[error("cannot restore {original}: path is occupied (item kept at {trashed})")]
    TargetOccupied {
        /// Path the item would be restored to
        original: PathBuf,
        /// Where the trashed item still is
        trashed: PathBuf,
    },

    /// The trashed item was removed from the holding area.
    #[error("cannot restore {original}: {trashed} no longer exists")]
    TrashedItemMissing {
        /// Path the item would be restored to
        original: PathBuf,
        /// Where the trashed item should have been
        trashed: PathBuf,
    },

    /// Moving the item back failed.
    #[error("I/O error restoring {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Outcome of [`TrashManager::trash_batch`].
#[derive(Debug, Default)]
pub struct BatchTrashResult {
    /// Records for items that were moved
    pub trashed: Vec<TrashRecord>,
    /// Items that could not be moved
    pub failures: Vec<(PathBuf, ActionError)>,
}

impl BatchTrashResult {
    /// Number of items moved.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.trashed.len()
    }

    /// Number of failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Whether every item was moved.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!("Trashed {} item(s)", self.success_count())
        } else {
            format!(
                "Trashed {} item(s), {} failed",
                self.success_count(),
                self.failure_count()
            )
        }
    }
}
