//! dirdupe - find directories full of duplicated files
//!
//! Scans one or more directory trees, fingerprints every file with BLAKE3,
//! and ranks directories by how much of their content exists elsewhere. An
//! interactive browser lets you drill into directories and move redundant
//! copies to a holding area, with undo.
//!
//! # Library use
//!
//! ```no_run
//! use dirdupe::duplicates::find_duplicates;
//! use std::path::PathBuf;
//!
//! let roots = vec![PathBuf::from("/photos"), PathBuf::from("/backup")];
//! let index = find_duplicates(&roots, true, true, 4).unwrap();
//! for (dir, stats) in index.directories_by_redundancy().iter().take(10) {
//!     println!("{:>5.1}% {}", stats.redundancy_score * 100.0, dir.display());
//! }
//! ```

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod session;
pub mod signal;
pub mod tui;

use anyhow::{Context, Result};

use crate::cli::{BrowseArgs, Cli, Commands, ScanArgs, ScanOptions};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::scanner::WalkerConfig;
use crate::session::{Session, SessionConfig};
use crate::signal::ShutdownHandler;
use crate::tui::{run_tui, App, Theme};

/// Run the CLI and return the process exit code.
///
/// # Errors
///
/// Returns configuration, scan and terminal failures.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let shutdown = signal::install_handler().unwrap_or_else(|e| {
        log::warn!("{}; Ctrl+C will not stop a scan cleanly", e);
        ShutdownHandler::new()
    });

    match cli.command {
        Commands::Scan(ref args) => run_scan(&cli, args, &config, &shutdown),
        Commands::Browse(ref args) => run_browse(&cli, args, &config, &shutdown),
    }
}

/// Merge config file values with CLI flags. Flags win.
fn session_config(options: &ScanOptions, config: &Config, shutdown: &ShutdownHandler) -> SessionConfig {
    let mut ignore_patterns = config.ignore_patterns.clone();
    ignore_patterns.extend(options.ignore_patterns.iter().cloned());

    SessionConfig {
        jobs: options.jobs.unwrap_or(config.jobs).max(1),
        use_cache: config.use_cache && !options.no_cache,
        cache_path: options.cache.clone().or_else(|| config.cache_path.clone()),
        walker_config: WalkerConfig::new(
            options.follow_symlinks || config.follow_symlinks,
            options.skip_hidden || config.skip_hidden,
            options.min_size,
            options.max_size,
            ignore_patterns,
        ),
        trash_dir: config.trash_dir.clone(),
        shutdown_flag: Some(shutdown.get_flag()),
    }
}

fn run_scan(cli: &Cli, args: &ScanArgs, config: &Config, shutdown: &ShutdownHandler) -> Result<ExitCode> {
    let mut session = Session::with_config(
        args.options.paths.clone(),
        session_config(&args.options, config, shutdown),
    );
    session
        .scan(cli.quiet || args.json)
        .context("scan failed")?;

    let index = session.index();
    let exit_code = ExitCode::for_index(index);
    let mut stdout = std::io::stdout().lock();
    if args.json {
        JsonOutput::new(session.root_paths(), index, args.limit, exit_code).write_to(&mut stdout, true)?;
    } else if !cli.quiet {
        TextOutput::new(index, args.limit).write_to(&mut stdout)?;
    }

    for err in &index.summary.errors {
        log::debug!("skipped: {}", err);
    }
    Ok(exit_code)
}

fn run_browse(cli: &Cli, args: &BrowseArgs, config: &Config, shutdown: &ShutdownHandler) -> Result<ExitCode> {
    let mut session_config = session_config(&args.options, config, shutdown);
    if args.trash_dir.is_some() {
        session_config.trash_dir = args.trash_dir.clone();
    }

    let mut session = Session::with_config(args.options.paths.clone(), session_config);
    session.scan(cli.quiet).context("scan failed")?;

    // Ctrl+C during the scan stops the scan; inside the browser it quits.
    shutdown.reset();

    let theme = if cli.no_color {
        Theme::monochrome()
    } else {
        Theme::dark()
    };
    let mut app = App::new(session).with_theme(theme);
    run_tui(&mut app, Some(shutdown.get_flag()))?;

    let mut session = app.into_session();
    if args.empty_trash && !session.trash_stack().is_empty() {
        let cleared = session
            .empty_trash()
            .context("failed to empty the holding area")?;
        if !cli.quiet {
            println!("{} trashed item(s) sent to the recycle bin", cleared);
        }
    }

    let kept = session.trash_stack().len();
    if kept > 0 && !cli.quiet {
        println!(
            "{} item(s) kept in {} (undo is no longer available; delete it or move items back by hand)",
            kept,
            session.trash_manager().holding_area().display()
        );
    }
    Ok(ExitCode::for_index(session.index()))
}
