//! Cache entry definitions.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::scanner::FileEntry;

/// Identity of a file as seen by the cache: path, size and mtime.
///
/// A stored hash is only returned when all three still match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl CacheEntry {
    /// Create a new cache entry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, mtime: SystemTime) -> Self {
        Self { path, size, mtime }
    }

    /// Modification time as signed nanoseconds since the Unix epoch.
    #[must_use]
    pub fn mtime_nanos(&self) -> i64 {
        system_time_to_nanos(self.mtime)
    }
}

impl From<FileEntry> for CacheEntry {
    fn from(file: FileEntry) -> Self {
        Self::new(file.path, file.size, file.modified)
    }
}

impl From<&FileEntry> for CacheEntry {
    fn from(file: &FileEntry) -> Self {
        Self::new(file.path.clone(), file.size, file.modified)
    }
}

/// Convert a timestamp into signed nanoseconds relative to the Unix epoch.
///
/// Values beyond the `i64` range saturate.
#[must_use]
pub fn system_time_to_nanos(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_nanos())
            .map(|n| -n)
            .unwrap_or(i64::MIN),
    }
}

/// Inverse of [`system_time_to_nanos`].
#[must_use]
pub fn nanos_to_system_time(nanos: i64) -> SystemTime {
    if nanos >= 0 {
        UNIX_EPOCH + Duration::from_nanos(nanos.unsigned_abs())
    } else {
        UNIX_EPOCH - Duration::from_nanos(nanos.unsigned_abs())
    }
}
