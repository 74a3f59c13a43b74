//! Fingerprint cache.
//!
//! Persists content hashes between runs so unchanged files are not
//! re-read on every scan.
//!
//! * [`database`]: SQLite persistence and lookups.
//! * [`entry`]: the identity key stored alongside each hash.
//!
//! # Cache Invalidation
//!
//! An entry is only returned when path, size and modification time all
//! match the file on disk. Anything else is a miss and the file is
//! re-hashed. A cache that cannot be opened is treated as permanently
//! empty by the finder.

pub mod database;
pub mod entry;

use std::path::PathBuf;

pub use database::{CacheError, CacheResult, HashCache};
pub use entry::CacheEntry;

/// Default location of the cache database in the platform cache directory.
#[must_use]
pub fn default_cache_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dirdupe")
        .map(|dirs| dirs.cache_dir().join("hashes.db"))
}
