//! Run options and file-exclusion rules from a TOML configuration file.
//!
//! Configuration is optional: with no file present, the defaults apply
//! (hidden files skipped, restore log at `restore_log.json` in the working
//! directory, nothing excluded). Category rules are deliberately not part of
//! the file; rule edits are session-scoped CLI flags.
//!
//! # File format
//!
//! ```toml
//! [options]
//! include_hidden_files = false
//! restore_log = "restore_log.json"
//!
//! [exclude]
//! filenames = ["Thumbs.db"]
//! extensions = ["bak", "tmp"]
//! patterns = ["*.partial"]
//! regex = ['^~\$']
//! ```

use crate::ledger::DEFAULT_LEDGER_FILE;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file searched for in the working directory.
const LOCAL_CONFIG_FILE: &str = ".sortboxrc.toml";

/// Errors from loading or compiling configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A glob pattern failed to compile.
    InvalidGlobPattern(String),
    /// A regex pattern failed to compile.
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            Self::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            Self::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            Self::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub options: RunOptions,
    pub exclude: ExcludeRules,
}

/// General run options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Whether files starting with "." are organized. Off by default.
    pub include_hidden_files: bool,
    /// Where the restore log is persisted, relative to the working directory.
    pub restore_log: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            include_hidden_files: false,
            restore_log: PathBuf::from(DEFAULT_LEDGER_FILE),
        }
    }
}

/// Files to leave untouched during organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Exact filenames (e.g. "Thumbs.db").
    pub filenames: Vec<String>,
    /// File extensions, matched case-insensitively.
    pub extensions: Vec<String>,
    /// Glob patterns matched against the file path.
    pub patterns: Vec<String>,
    /// Regex patterns matched against the file name.
    pub regex: Vec<String>,
}

impl RunConfig {
    /// Loads configuration, falling back through the usual locations:
    /// an explicit path, then `.sortboxrc.toml` in the working directory,
    /// then `~/.config/sortbox/config.toml`, then the defaults.
    ///
    /// Only an explicitly requested file may fail with `ConfigNotFound`.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortbox")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Pre-compiles the exclusion rules into matchers.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled exclusion matchers, so per-file checks never reparse patterns.
#[derive(Debug)]
pub struct CompiledFilters {
    include_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl Default for CompiledFilters {
    /// No exclusions beyond the hidden-file default.
    fn default() -> Self {
        Self {
            include_hidden_files: false,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}

impl CompiledFilters {
    fn new(config: &RunConfig) -> Result<Self, ConfigError> {
        let exclude_patterns = config
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = config
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden_files: config.options.include_hidden_files,
            exclude_filenames: config.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: config
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Whether a file takes part in organization.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.include_hidden_files && file_name.starts_with('.') {
            return false;
        }
        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }
        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }
        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }
        if self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
        {
            return false;
        }

        true
    }
}
