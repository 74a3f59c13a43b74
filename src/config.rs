//! Layered application configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults
//! 2. `config.toml` in the platform config directory
//! 3. `DIRDUPE_*` environment variables
//! 4. CLI flags (applied by the caller)

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::duplicates::DEFAULT_JOBS;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DIRDUPE_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hashing threads.
    pub jobs: usize,
    /// Use the persistent fingerprint cache.
    pub use_cache: bool,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Skip dot files and dot directories.
    pub skip_hidden: bool,
    /// Gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
    /// Holding area for trashed items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trash_dir: Option<PathBuf>,
    /// Fingerprint cache database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            use_cache: true,
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            trash_dir: None,
            cache_path: None,
        }
    }
}

impl Config {
    /// Load from the default locations, falling back to defaults on error.
    pub fn load() -> Self {
        let figment = match Self::config_path() {
            Ok(path) => Self::figment(Some(&path)),
            Err(e) => {
                log::debug!("No config directory: {}", e);
                Self::figment(None)
            }
        };
        match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring invalid configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Load from an explicit file plus the environment.
    ///
    /// # Errors
    ///
    /// Fails if the file or an environment variable does not parse.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::figment(Some(path))
            .extract()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// The layered provider chain. A missing file contributes nothing.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Write to the default location.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or the file written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Write as TOML to `path`.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or the file written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }

    /// `config.toml` in the platform config directory.
    ///
    /// # Errors
    ///
    /// Fails when no home directory can be determined.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "dirdupe")
            .ok_or_else(|| anyhow::anyhow!("cannot determine project directories"))?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}
