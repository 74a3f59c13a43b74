//! SQLite-backed hash cache database.
//!
//! The connection lives behind a mutex so one cache can be shared by every
//! hashing worker. Two workers inserting the same key is harmless: the
//! statement is `INSERT OR REPLACE`, so the last write wins.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use rusqlite::{params, Connection, OptionalExtension};

use super::entry::{system_time_to_nanos, CacheEntry};
use crate::scanner::Hash;

/// Errors produced by the hash cache.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The underlying SQLite database reported an error.
    #[error("cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The cache directory could not be created.
    #[error("cannot create cache directory {path}: {source}")]
    Io {
        /// Directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A worker panicked while holding the connection.
    #[error("cache connection lock poisoned")]
    Poisoned,

    /// A stored hash had the wrong length.
    #[error("corrupt hash stored for {0}")]
    CorruptHash(PathBuf),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Bumped whenever the table layout changes; older tables are dropped.
const SCHEMA_VERSION: i64 = 2;

// Paths are keyed by their raw OS bytes so distinct names never collapse.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS file_hashes (
    path       BLOB PRIMARY KEY NOT NULL,
    size       INTEGER NOT NULL,
    mtime_ns   INTEGER NOT NULL,
    hash       BLOB NOT NULL,
    updated_at INTEGER NOT NULL
);
";

/// Persistent cache for file hashes using SQLite.
pub struct HashCache {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for HashCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashCache")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl HashCache {
    /// Opens or creates a hash cache at the specified path.
    ///
    /// # Errors
    ///
    /// Fails if the parent directory cannot be created or the file is not
    /// a usable SQLite database.
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Creates a cache that lives only as long as this value.
    ///
    /// # Errors
    ///
    /// Fails only if SQLite cannot allocate the in-memory database.
    pub fn open_in_memory() -> CacheResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> CacheResult<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        // Touches the file header, so a corrupt file fails here.
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version < SCHEMA_VERSION {
            log::debug!("Hash cache schema {} is outdated, rebuilding", version);
            conn.execute_batch("DROP TABLE IF EXISTS file_hashes;")?;
        }
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        log::debug!(
            "Hash cache opened at {}",
            path.as_deref()
                .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
        );
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Location of the database file, if not in memory.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Look up the hash for a file identity.
    ///
    /// Returns `Ok(None)` if the path is unknown or its size or mtime changed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn get(&self, path: &Path, size: u64, mtime: SystemTime) -> CacheResult<Option<Hash>> {
        let conn = self.lock()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT hash FROM file_hashes WHERE path = ?1 AND size = ?2 AND mtime_ns = ?3",
                params![
                    path_key(path),
                    size_to_sql(size),
                    system_time_to_nanos(mtime)
                ],
                |row| row.get(0),
            )
            .optional()?;

        blob.map(|bytes| {
            <Hash>::try_from(bytes.as_slice())
                .map_err(|_| CacheError::CorruptHash(path.to_path_buf()))
        })
        .transpose()
    }

    /// Store (or replace) the hash for a file identity.
    ///
    /// # Errors
    ///
    /// Returns a database error if the write fails.
    pub fn insert(&self, entry: &CacheEntry, hash: Hash) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO file_hashes (path, size, mtime_ns, hash, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                path_key(&entry.path),
                size_to_sql(entry.size),
                entry.mtime_nanos(),
                &hash[..],
                chrono::Utc::now().timestamp()
            ],
        )?;
        Ok(())
    }

    /// Forget a single path.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn remove(&self, path: &Path) -> CacheResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM file_hashes WHERE path = ?1",
            params![path_key(path)],
        )?;
        Ok(removed > 0)
    }

    /// Number of cached entries.
    ///
    /// # Errors
    ///
    /// Returns a database error if the count query fails.
    pub fn len(&self) -> CacheResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM file_hashes", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether the cache holds no entries.
    ///
    /// # Errors
    ///
    /// Returns a database error if the count query fails.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn clear(&self) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM file_hashes", [])?;
        log::debug!("Hash cache cleared");
        Ok(())
    }

    /// Drop entries whose file no longer exists. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns a database error if reading or deleting fails.
    pub fn prune_missing(&self) -> CacheResult<usize> {
        let conn = self.lock()?;
        let keys: Vec<Vec<u8>> = {
            let mut stmt = conn.prepare("SELECT path FROM file_hashes")?;
            let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let mut removed = 0;
        for key in keys {
            let missing = key_to_path(key.clone()).is_some_and(|p| !p.exists());
            if missing {
                removed += conn.execute("DELETE FROM file_hashes WHERE path = ?1", params![key])?;
            }
        }

        if removed > 0 {
            log::info!("Pruned {} stale cache entries", removed);
        }
        Ok(removed)
    }
}

fn path_key(path: &Path) -> &[u8] {
    path.as_os_str().as_encoded_bytes()
}

#[cfg(unix)]
fn key_to_path(key: Vec<u8>) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStringExt;
    Some(PathBuf::from(OsString::from_vec(key)))
}

// Keys that are not UTF-8 are left alone rather than guessed at.
#[cfg(not(unix))]
fn key_to_path(key: Vec<u8>) -> Option<PathBuf> {
    String::from_utf8(key).ok().map(|s| PathBuf::from(OsString::from(s)))
}

// SQLite integers are signed; sizes above i64::MAX do not occur in practice.
fn size_to_sql(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}
