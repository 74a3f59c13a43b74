//! Human-readable redundancy report.

use std::io::Write;
use std::path::PathBuf;

use bytesize::ByteSize;
use yansi::Paint;

use crate::duplicates::{DirStats, DuplicateIndex};

/// Plain-text report: the most redundant directories plus a summary.
#[derive(Debug)]
pub struct TextOutput<'a> {
    index: &'a DuplicateIndex,
    limit: usize,
}

impl<'a> TextOutput<'a> {
    /// Report over `index`, listing at most `limit` directories.
    #[must_use]
    pub fn new(index: &'a DuplicateIndex, limit: usize) -> Self {
        Self { index, limit }
    }

    /// Directories to list.
    #[must_use]
    pub fn rows(&self) -> Vec<(PathBuf, DirStats)> {
        self.index
            .directories_by_redundancy()
            .into_iter()
            .filter(|(_, stats)| stats.duplicate_count > 0)
            .take(self.limit)
            .collect()
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let rows = self.rows();
        if rows.is_empty() {
            writeln!(writer, "{}", "No duplicated files found.".green())?;
        } else {
            writeln!(
                writer,
                "{}",
                format!("{:>6}  {:>11}  {}", "score", "dups/files", "directory").bold()
            )?;
            for (path, stats) in &rows {
                let score = format!("{:>5.1}%", stats.redundancy_score * 100.0);
                let score = if stats.redundancy_score >= 1.0 {
                    score.red().bold()
                } else if stats.redundancy_score >= 0.5 {
                    score.yellow()
                } else {
                    score.primary()
                };
                writeln!(
                    writer,
                    "{}  {:>11}  {}",
                    score,
                    format!("{}/{}", stats.duplicate_count, stats.file_count),
                    path.display()
                )?;
            }
        }

        let summary = &self.index.summary;
        writeln!(writer)?;
        writeln!(
            writer,
            "{} files ({}) in {} directories, {} duplicated across {} sets",
            self.index.total_files,
            ByteSize::b(summary.total_size),
            summary.directories,
            self.index.total_duplicates.bold(),
            summary.duplicate_sets
        )?;
        if summary.cache_hits + summary.cache_misses > 0 {
            writeln!(
                writer,
                "cache: {} hits, {} misses",
                summary.cache_hits, summary.cache_misses
            )?;
        }
        if summary.has_skipped() {
            writeln!(
                writer,
                "{}",
                format!(
                    "skipped {} files and {} directories (run with -v for details)",
                    summary.skipped_files, summary.skipped_dirs
                )
                .yellow()
            )?;
        }
        writeln!(writer, "scanned in {:.2?}", summary.scan_duration)?;
        Ok(())
    }
}
