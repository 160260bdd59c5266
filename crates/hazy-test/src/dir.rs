//! Temporary fixture roots.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hazy_core::Config;
use serde_json::Value;
use tempfile::TempDir;

/// A temporary directory to use as a fixture root.
///
/// The directory and everything written to it is deleted on drop.
#[derive(Debug)]
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    /// Creates an empty fixture root.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Returns the root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns a default configuration rooted at this directory.
    #[must_use]
    pub fn config(&self) -> Config {
        Config::new().with_root(self.path())
    }

    /// Writes raw text to `name`, creating parent directories.
    ///
    /// The text is written as is, so it may contain unquoted expressions.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Writes `value` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_json(&self, name: &str, value: &Value) -> io::Result<PathBuf> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.write(name, &text)
    }
}
