//! Configuration module for termchan.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{Result, TermchanError};

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding the board list, counters and board indexes.
    #[serde(default = "default_root")]
    pub root: String,
    /// Path to the board list document (defaults to `{root}/boardlist`).
    #[serde(default)]
    pub boardlist_path: Option<String>,
    /// Path to the post number document (defaults to `{root}/postnums`).
    #[serde(default)]
    pub postnums_path: Option<String>,
}

fn default_root() -> String {
    "data".to_string()
}

impl StorageConfig {
    /// Create a storage configuration rooted at the given directory.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            boardlist_path: None,
            postnums_path: None,
        }
    }

    /// Resolved path of the board list document.
    pub fn boardlist_path(&self) -> PathBuf {
        match &self.boardlist_path {
            Some(path) => PathBuf::from(path),
            None => Path::new(&self.root).join("boardlist"),
        }
    }

    /// Resolved path of the post number document.
    pub fn postnums_path(&self) -> PathBuf {
        match &self.postnums_path {
            Some(path) => PathBuf::from(path),
            None => Path::new(&self.root).join("postnums"),
        }
    }

    /// Directory holding one subdirectory per board.
    pub fn boards_dir(&self) -> PathBuf {
        Path::new(&self.root).join("boards")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(default_root())
    }
}

/// Board server information.
#[derive(Debug, Clone, Deserialize)]
pub struct BbsConfig {
    /// Name shown to users.
    #[serde(default = "default_bbs_name")]
    pub name: String,
    /// Version string shown to users.
    #[serde(default = "default_version")]
    pub version: String,
    /// Timezone for displaying post times (e.g., "UTC", "Europe/Warsaw").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_bbs_name() -> String {
    "termchan".to_string()
}

fn default_version() -> String {
    "0.1".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for BbsConfig {
    fn default() -> Self {
        Self {
            name: default_bbs_name(),
            version: default_version(),
            timezone: default_timezone(),
        }
    }
}

/// Board display configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Maximum number of lines reserved for threads on a board page.
    ///
    /// One of them is kept for the status line, see [`Config::page_size`].
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
}

fn default_max_threads() -> usize {
    15
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_threads: default_max_threads(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/termchan.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Server information.
    #[serde(default)]
    pub bbs: BbsConfig,
    /// Display configuration.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(TermchanError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| TermchanError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `TERMCHAN_ROOT`: Override the storage root directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("TERMCHAN_ROOT") {
            if !root.is_empty() {
                self.storage.root = root;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.storage.root.trim().is_empty() {
            return Err(TermchanError::Config(
                "storage.root must not be empty".to_string(),
            ));
        }
        if self.display.max_threads < 2 {
            return Err(TermchanError::Config(format!(
                "display.max_threads must be at least 2, got {}",
                self.display.max_threads
            )));
        }
        Ok(())
    }

    /// Number of threads shown per board page.
    ///
    /// One less than `max_threads`; the last line is the page status line.
    pub fn page_size(&self) -> usize {
        self.display.max_threads.saturating_sub(1)
    }
}
