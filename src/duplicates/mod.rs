//! Duplicate detection.
//!
//! - [`finder`]: walks roots and fingerprints files in parallel
//! - [`index`]: aggregates fingerprints into cross-directory indexes

pub mod finder;
pub mod index;

pub use finder::{
    find_duplicates, open_cache, DuplicateFinder, FinderConfig, FinderError, ScanSummary,
    DEFAULT_JOBS,
};
pub use index::{build_index, calculate_redundancy_score, DirStats, DuplicateGroup, DuplicateIndex};
