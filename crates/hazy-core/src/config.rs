//! Configuration for a Hazy context.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HazyError, Result};

/// Configuration for fixture processing.
///
/// # Examples
///
/// ```
/// use hazy_core::Config;
///
/// let config = Config::new().with_seed(7).with_matching(false);
/// assert_eq!(config.seed, Some(7));
/// assert!(!config.matcher.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for the default random provider. `None` draws from OS entropy.
    pub seed: Option<u64>,

    /// Forward-declared: fixtures are always evaluated at registration.
    pub lazy: bool,

    /// Emit a debug event for every evaluated expression.
    pub debug: bool,

    /// Structural matcher settings.
    pub matcher: MatcherConfig,

    /// Forward-declared error handling knobs.
    pub errors: ErrorConfig,

    /// Directory that relative fixture file paths resolve against.
    pub root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            lazy: true,
            debug: false,
            matcher: MatcherConfig::default(),
            errors: ErrorConfig::default(),
            root: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables structural matching globally.
    #[must_use]
    pub const fn with_matching(mut self, enabled: bool) -> Self {
        self.matcher.enabled = enabled;
        self
    }

    /// Enables per-expression debug events.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the lazy flag.
    #[must_use]
    pub const fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Sets the directory fixture files are resolved against.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Resolves a fixture path against [`Config::root`]. Absolute paths are
    /// returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use hazy_core::Config;
    /// use std::path::PathBuf;
    ///
    /// let config = Config::new().with_root("/fixtures");
    /// assert_eq!(config.resolve("users.json"), PathBuf::from("/fixtures/users.json"));
    /// ```
    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read(path)?;
        let config = serde_json::from_str(&content).map_err(|e| HazyError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read(path)?;
        let config = serde_yaml::from_str(&content).map_err(|e| HazyError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| HazyError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Structural matcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Globally enables matching on reads, processing and searches.
    #[serde(rename = "use")]
    pub enabled: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Error handling knobs. Not consulted yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorConfig {
    /// Suppress errors.
    pub quiet: bool,
    /// Downgrade errors to warnings.
    pub soft: bool,
}
