//! JSON report.
//!
//! # Schema
//!
//! ```json
//! {
//!   "roots": ["/photos", "/backup"],
//!   "directories": [
//!     { "path": "/backup/2019", "file_count": 10, "duplicate_count": 10, "redundancy_score": 1.0 }
//!   ],
//!   "duplicate_groups": [
//!     { "hash": "af13...", "files": ["/photos/a.jpg", "/backup/a.jpg"] }
//!   ],
//!   "summary": {
//!     "total_files": 120,
//!     "total_duplicates": 24,
//!     "duplicate_sets": 12,
//!     "exit_code": 0,
//!     "exit_code_name": "DD000"
//!   }
//! }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, DuplicateIndex, ScanSummary};
use crate::error::ExitCode;

/// One directory row.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDirectory {
    /// Directory path
    pub path: String,
    /// Files directly inside
    pub file_count: usize,
    /// Of those, files whose content exists elsewhere too
    pub duplicate_count: usize,
    /// `duplicate_count / file_count`
    pub redundancy_score: f64,
}

/// Scan diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files indexed
    pub total_files: usize,
    /// Files whose content occurs more than once
    pub total_duplicates: usize,
    /// Distinct duplicated contents
    pub duplicate_sets: usize,
    /// Bytes hashed
    pub total_size: u64,
    /// Directories indexed
    pub directories: usize,
    /// Files that could not be read
    pub skipped_files: usize,
    /// Directories that could not be listed
    pub skipped_dirs: usize,
    /// Fingerprints served from the cache
    pub cache_hits: usize,
    /// Fingerprints computed
    pub cache_misses: usize,
    /// Wall time in milliseconds
    pub scan_duration_ms: u64,
    /// Process exit code
    pub exit_code: i32,
    /// Code such as `DD000`
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Collect diagnostics from an index and its summary.
    #[must_use]
    pub fn new(index: &DuplicateIndex, summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: index.total_files,
            total_duplicates: index.total_duplicates,
            duplicate_sets: summary.duplicate_sets,
            total_size: summary.total_size,
            directories: summary.directories,
            skipped_files: summary.skipped_files,
            skipped_dirs: summary.skipped_dirs,
            cache_hits: summary.cache_hits,
            cache_misses: summary.cache_misses,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// The full report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Roots as given
    pub roots: Vec<String>,
    /// Directories, most redundant first
    pub directories: Vec<JsonDirectory>,
    /// Duplicate sets, largest first
    pub duplicate_groups: Vec<DuplicateGroup>,
    /// Diagnostics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build a report from an index, keeping at most `limit` directories.
    #[must_use]
    pub fn new(roots: &[PathBuf], index: &DuplicateIndex, limit: usize, exit_code: ExitCode) -> Self {
        let directories = index
            .directories_by_redundancy()
            .into_iter()
            .take(limit)
            .map(|(path, stats)| JsonDirectory {
                path: display(&path),
                file_count: stats.file_count,
                duplicate_count: stats.duplicate_count,
                redundancy_score: stats.redundancy_score,
            })
            .collect();

        Self {
            roots: roots.iter().map(|r| display(r)).collect(),
            directories,
            duplicate_groups: index.duplicate_groups(),
            summary: JsonSummary::new(index, &index.summary, exit_code),
        }
    }

    /// Serialize, optionally pretty-printed.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Write the report followed by a newline.
    ///
    /// # Errors
    ///
    /// Fails on serialization or write errors.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> anyhow::Result<()> {
        let json = self.to_json(pretty)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        Ok(())
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
