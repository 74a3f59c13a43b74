//! Reversible trash operations with a LIFO undo stack.
//!
//! # Overview
//!
//! [`TrashManager`] moves items into a holding area instead of deleting
//! them. Each move gets its own slot directory so items with the same name
//! never collide, and a [`TrashRecord`] is pushed so the move can be undone.
//!
//! ```text
//! <holding area>/
//!   20260101T120000.000000001-0/
//!     report.pdf
//!   20260101T120005.000000002-1/
//!     photos/
//! ```
//!
//! Nothing is ever unlinked. [`TrashManager::empty_holding_area`] hands the
//! holding area to the operating system's recycle bin.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::fs_move::{move_item, remove_any};
use super::{ActionError, BatchTrashResult, ItemKind, TrashRecord, UndoError};

/// Name of the holding area created inside the first scan root.
pub const HOLDING_AREA_NAME: &str = ".dirdupe-trash";

/// Default holding area for a set of scan roots.
///
/// The holding area lives inside the first root so moves stay on one
/// filesystem; walkers must exclude it. Without roots the platform data
/// directory is used.
#[must_use]
pub fn default_holding_area(roots: &[PathBuf]) -> PathBuf {
    if let Some(first) = roots.first() {
        let root = std::path::absolute(first).unwrap_or_else(|_| first.clone());
        return root.join(HOLDING_AREA_NAME);
    }
    directories::ProjectDirs::from("", "", "dirdupe")
        .map(|dirs| dirs.data_dir().join("trash"))
        .unwrap_or_else(|| std::env::temp_dir().join(HOLDING_AREA_NAME))
}

/// Owns the holding area and the undo stack.
#[derive(Debug)]
pub struct TrashManager {
    holding_area: PathBuf,
    stack: Vec<TrashRecord>,
    next_slot: u64,
}

impl TrashManager {
    /// Create a manager using `holding_area`. The directory is created lazily.
    #[must_use]
    pub fn new(holding_area: PathBuf) -> Self {
        let holding_area = std::path::absolute(&holding_area).unwrap_or(holding_area);
        Self {
            holding_area,
            stack: Vec::new(),
            next_slot: 0,
        }
    }

    /// Where trashed items are kept.
    #[must_use]
    pub fn holding_area(&self) -> &Path {
        &self.holding_area
    }

    /// Trash records, oldest first.
    #[must_use]
    pub fn stack(&self) -> &[TrashRecord] {
        &self.stack
    }

    /// The record `undo_last_trash` would act on.
    #[must_use]
    pub fn last(&self) -> Option<&TrashRecord> {
        self.stack.last()
    }

    /// Number of undoable actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether there is nothing to undo.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Move `path` into the holding area and record it.
    ///
    /// # Errors
    ///
    /// - [`ActionError::NotFound`] if `path` does not exist
    /// - [`ActionError::KindMismatch`] if `path` is not a `kind`
    /// - [`ActionError::PermissionDenied`] or [`ActionError::Io`] if the move fails
    ///
    /// On error no record is pushed and `path` is untouched. Relative paths
    /// are resolved against the current directory before anything else.
    pub fn trash_item(&mut self, path: &Path, kind: ItemKind) -> Result<TrashRecord, ActionError> {
        let path = &std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let meta = fs::symlink_metadata(path).map_err(|e| ActionError::from_io(path, e))?;
        let actual = ItemKind::of(&meta);
        if actual != kind {
            return Err(ActionError::KindMismatch {
                path: path.to_path_buf(),
                expected: kind,
                actual,
            });
        }

        if self.holding_area.starts_with(path) || path.starts_with(&self.holding_area) {
            return Err(ActionError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("overlaps the holding area {}", self.holding_area.display()),
                ),
            });
        }

        let name = path.file_name().ok_or_else(|| ActionError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })?;

        let created_area = !self.holding_area.exists();
        let slot = self.create_slot()?;
        let trashed_location = slot.join(name);

        if let Err(e) = move_item(path, &trashed_location) {
            log::warn!("Failed to trash {}: {}", path.display(), e);
            fs::remove_dir(&slot).ok();
            if created_area {
                fs::remove_dir(&self.holding_area).ok();
            }
            return Err(ActionError::from_io(path, e));
        }

        let record = TrashRecord {
            original_path: path.to_path_buf(),
            trashed_location,
            kind,
            timestamp: Utc::now(),
        };
        log::info!(
            "Trashed {} {} -> {}",
            kind,
            path.display(),
            record.trashed_location.display()
        );
        self.stack.push(record.clone());
        Ok(record)
    }

    /// Trash several items, one record each. Failures do not stop the batch.
    pub fn trash_batch<I>(&mut self, items: I) -> BatchTrashResult
    where
        I: IntoIterator<Item = (PathBuf, ItemKind)>,
    {
        let mut result = BatchTrashResult::default();
        for (path, kind) in items {
            match self.trash_item(&path, kind) {
                Ok(record) => result.trashed.push(record),
                Err(e) => result.failures.push((path, e)),
            }
        }
        log::info!("{}", result.summary());
        result
    }

    /// Move the most recently trashed item back.
    ///
    /// Returns `Ok(None)` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// - [`UndoError::TargetOccupied`] if something now exists at the original path
    /// - [`UndoError::TrashedItemMissing`] if the holding area copy is gone
    /// - [`UndoError::Io`] if moving it back fails
    ///
    /// On error the record stays on the stack so the undo can be retried.
    pub fn undo_last_trash(&mut self) -> Result<Option<TrashRecord>, UndoError> {
        let Some(record) = self.stack.last() else {
            return Ok(None);
        };

        match fs::symlink_metadata(&record.trashed_location) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(UndoError::TrashedItemMissing {
                    original: record.original_path.clone(),
                    trashed: record.trashed_location.clone(),
                });
            }
            Err(source) => {
                return Err(UndoError::Io {
                    path: record.trashed_location.clone(),
                    source,
                })
            }
        }

        if fs::symlink_metadata(&record.original_path).is_ok() {
            return Err(UndoError::TargetOccupied {
                original: record.original_path.clone(),
                trashed: record.trashed_location.clone(),
            });
        }

        if let Some(parent) = record.original_path.parent() {
            fs::create_dir_all(parent).map_err(|source| UndoError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        move_item(&record.trashed_location, &record.original_path).map_err(|source| {
            UndoError::Io {
                path: record.original_path.clone(),
                source,
            }
        })?;

        if let Some(slot) = record.trashed_location.parent() {
            fs::remove_dir(slot).ok();
        }

        let record = self.stack.pop();
        if let Some(ref r) = record {
            log::info!("Restored {} {}", r.kind, r.original_path.display());
        }
        Ok(record)
    }

    /// Drop the most recent record without touching the filesystem.
    ///
    /// Used when an undo cannot succeed and the user gives up on it.
    pub fn discard_last_record(&mut self) -> Option<TrashRecord> {
        let record = self.stack.pop();
        if let Some(ref r) = record {
            log::warn!(
                "Discarded undo record for {} (kept at {})",
                r.original_path.display(),
                r.trashed_location.display()
            );
        }
        record
    }

    /// Send the whole holding area to the system recycle bin and clear the stack.
    ///
    /// Returns the number of records cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Io`] if the recycle bin rejects the directory;
    /// the stack is kept in that case.
    pub fn empty_holding_area(&mut self) -> Result<usize, ActionError> {
        if fs::symlink_metadata(&self.holding_area).is_ok() {
            ::trash::delete(&self.holding_area).map_err(|e| {
                log::error!(
                    "Recycle bin rejected {}: {}",
                    self.holding_area.display(),
                    e
                );
                ActionError::Io {
                    path: self.holding_area.clone(),
                    source: io::Error::other(e.to_string()),
                }
            })?;
        }
        let cleared = self.stack.len();
        self.stack.clear();
        log::info!("Holding area emptied, {} record(s) cleared", cleared);
        Ok(cleared)
    }

    fn create_slot(&mut self) -> Result<PathBuf, ActionError> {
        fs::create_dir_all(&self.holding_area)
            .map_err(|e| ActionError::from_io(&self.holding_area, e))?;

        loop {
            let name = format!(
                "{}-{}",
                Utc::now().format("%Y%m%dT%H%M%S%.9f"),
                self.next_slot
            );
            self.next_slot += 1;
            let slot = self.holding_area.join(name);
            match fs::create_dir(&slot) {
                Ok(()) => return Ok(slot),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(ActionError::from_io(&slot, e)),
            }
        }
    }
}

impl Drop for TrashManager {
    fn drop(&mut self) {
        // Leave no empty holding area behind.
        if self.stack.is_empty() {
            if let Ok(mut entries) = fs::read_dir(&self.holding_area) {
                if entries.next().is_none() {
                    remove_any(&self.holding_area).ok();
                }
            }
        }
    }
}
