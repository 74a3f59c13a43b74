//! Command-line interface.
//!
//! ```bash
//! # Report the most redundant directories across two trees
//! dirdupe scan ~/Photos /mnt/backup/Photos
//!
//! # Same, as JSON
//! dirdupe scan ~/Photos --json
//!
//! # Browse interactively and trash redundant copies
//! dirdupe browse ~/Photos /mnt/backup/Photos
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Find directories full of duplicated files.
#[derive(Debug, Parser)]
#[command(name = "dirdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print failures as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories and print a redundancy report
    Scan(ScanArgs),
    /// Scan directories and browse the results interactively
    Browse(BrowseArgs),
}

/// Options shared by every scanning subcommand.
#[derive(Debug, Clone, Args)]
pub struct ScanOptions {
    /// Directories to scan
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Hashing threads (default from config, else 4)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Do not read or write the fingerprint cache
    #[arg(long, conflicts_with = "cache")]
    pub no_cache: bool,

    /// Fingerprint cache database
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Follow symbolic links while walking
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip files and directories whose name starts with '.'
    #[arg(long)]
    pub skip_hidden: bool,

    /// Gitignore-style pattern to skip (repeatable)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Ignore files smaller than this (e.g. 1KB, 4MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Ignore files larger than this (e.g. 1GB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,
}

/// Arguments for `scan`.
#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub options: ScanOptions,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Show at most this many directories
    #[arg(long, value_name = "N", default_value = "50")]
    pub limit: usize,
}

/// Arguments for `browse`.
#[derive(Debug, Args)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub options: ScanOptions,

    /// Holding area for trashed items (default: .dirdupe-trash in the first path)
    #[arg(long, value_name = "DIR")]
    pub trash_dir: Option<PathBuf>,

    /// Send the holding area to the system recycle bin on exit
    #[arg(long)]
    pub empty_trash: bool,
}

/// Parse a human-readable size such as `10`, `1.5KB` or `2GiB`.
///
/// ```
/// use dirdupe::cli::parse_size;
///
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("2MB").unwrap(), 2_000_000);
/// ```
///
/// # Errors
///
/// Fails on an empty string, a bad number or an unknown suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
