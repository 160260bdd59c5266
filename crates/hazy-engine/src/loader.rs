//! Fixture file access: reading, parsing and glob expansion.
//!
//! The evaluation step between reading and parsing lives on
//! [`Hazy::src`](crate::Hazy::src); this module only deals with the file
//! system and document formats.

use std::fs;
use std::path::{Path, PathBuf};

use hazy_core::{Fixture, FixtureFormat, HazyError, Result};
use tracing::debug;

/// Reads the raw text of a fixture file.
///
/// # Errors
///
/// Returns [`HazyError::FileRead`] if the file cannot be read.
pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| HazyError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parses evaluated fixture text, picking the format from the extension.
///
/// # Errors
///
/// Returns [`HazyError::FixtureParse`] if the text is not a valid document.
pub fn parse_source(path: &Path, text: &str) -> Result<Fixture> {
    FixtureFormat::from_path(path)
        .parse(text)
        .map_err(|message| HazyError::FixtureParse {
            path: path.to_path_buf(),
            message,
        })
}

/// Expands `pattern` under `root` into sorted fixture paths.
///
/// Returned paths are relative to `root` when they live under it, so they
/// can be used as fixture names.
///
/// # Errors
///
/// Returns [`HazyError::Glob`] for a malformed pattern and
/// [`HazyError::FileRead`] for an unreadable directory entry.
pub fn expand(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    // The root is a literal directory; only `pattern` may hold wildcards.
    let full = if Path::new(pattern).is_absolute() {
        PathBuf::from(pattern)
    } else {
        PathBuf::from(glob::Pattern::escape(&root.to_string_lossy())).join(pattern)
    };
    let full = full.to_string_lossy();

    let entries = glob::glob(&full).map_err(|e| HazyError::Glob {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| HazyError::FileRead {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        if path.is_file() {
            paths.push(path.strip_prefix(root).map_or_else(|_| path.clone(), Path::to_path_buf));
        }
    }
    paths.sort();

    debug!(pattern, matched = paths.len(), "Expanded fixture glob");
    Ok(paths)
}

/// Outcome of a lenient batch load.
#[derive(Debug, Default)]
pub struct GlobReport {
    /// Fixtures that loaded, by the name they were registered under.
    pub loaded: Vec<(String, Fixture)>,
    /// Files that failed, with the reason.
    pub failed: Vec<(String, HazyError)>,
}

impl GlobReport {
    /// Returns true if every matched file loaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns the loaded fixtures in load order.
    #[must_use]
    pub fn fixtures(&self) -> Vec<&Fixture> {
        self.loaded.iter().map(|(_, fixture)| fixture).collect()
    }
}
