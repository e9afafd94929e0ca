//! Layered application configuration.
//!
//! Settings are merged in increasing priority:
//!
//! 1. Built-in defaults
//! 2. TOML config file (`--config <PATH>` or the platform default)
//! 3. `DUPSCAN_*` environment variables
//! 4. Command-line flags
//!
//! # Example file
//!
//! ```toml
//! min_size = 4096
//! workers = 8
//! queue_capacity = 256
//! output_dir = "/var/reports"
//! format = "json"
//! skip_errors = true
//! follow_symlinks = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::duplicates::{FinderConfig, DEFAULT_QUEUE_CAPACITY};
use crate::report::ReportFormat;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DUPSCAN_";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// The file or an environment variable could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] Box<figment::Error>),

    /// A value is out of range.
    #[error("Invalid value for '{key}': {message}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Parse(Box::new(err))
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inclusive size floor in bytes
    pub min_size: u64,
    /// Number of hashing workers; `None` means one per available CPU
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Capacity of the bounded path stream
    pub queue_capacity: usize,
    /// Directory the report is written to
    pub output_dir: PathBuf,
    /// Report format
    pub format: ReportFormat,
    /// Skip unreadable entries instead of aborting
    pub skip_errors: bool,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: 0,
            workers: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            output_dir: PathBuf::from("."),
            format: ReportFormat::Text,
            skip_errors: false,
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Load configuration from `explicit`, or from the platform default path.
    ///
    /// A missing default file is silently ignored; a missing explicit file
    /// is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing (explicit path only),
    /// cannot be parsed, or holds out-of-range values.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_from_path(path)
            }
            None => match default_config_path() {
                Some(path) => Self::load_from_path(&path),
                None => {
                    log::debug!("No platform config directory, using defaults");
                    Self::from_figment(Self::base_figment().merge(env_provider()))
                }
            },
        }
    }

    /// Load configuration from a specific TOML file plus the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if parsing or validation fails.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading config from {}", path.display());
        Self::from_figment(Self::base_figment().merge(Toml::file(path)).merge(env_provider()))
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero worker count or queue
    /// capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid {
                key: "workers",
                message: "must be at least 1".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "queue_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Apply command-line flags on top of the loaded settings.
    ///
    /// Flags that were not given leave the loaded value alone. Boolean
    /// switches can only turn a setting on.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(min_size) = cli.minsize {
            self.min_size = min_size;
        }
        if let Some(workers) = cli.workers {
            self.workers = Some(usize::try_from(workers).unwrap_or(usize::MAX));
        }
        if let Some(capacity) = cli.queue_capacity {
            self.queue_capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
        }
        if let Some(ref dir) = cli.output_dir {
            self.output_dir.clone_from(dir);
        }
        if let Some(format) = cli.format {
            self.format = format;
        }
        self.skip_errors |= cli.skip_errors;
        self.follow_symlinks |= cli.follow_symlinks;
    }

    /// Build the pipeline configuration described by these settings.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        let mut config = FinderConfig::default()
            .with_min_size(self.min_size)
            .with_follow_symlinks(self.follow_symlinks)
            .with_queue_capacity(self.queue_capacity)
            .with_skip_errors(self.skip_errors);
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        config
    }
}

/// Platform default config file, e.g. `~/.config/dupscan/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dupscan").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn env_provider() -> Env {
    // DUPSCAN_CONFIG names the file itself and is handled by the CLI.
    Env::prefixed(ENV_PREFIX).ignore(&["config"])
}
