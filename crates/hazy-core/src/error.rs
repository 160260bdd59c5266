//! Error types for Hazy fixture processing.
//!
//! Every failure surfaced by the expression language, the fixture pool and
//! the matcher pool is a [`HazyError`]. Callers that only care about the
//! broad class of a failure use [`HazyError::kind`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`HazyError`] as the error type.
pub type Result<T> = std::result::Result<T, HazyError>;

/// Broad classification of a [`HazyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed expression or structural query.
    Syntax,
    /// Unknown random category or subtype.
    Lookup,
    /// Missing, unreadable or unparseable fixture file.
    Io,
    /// A matcher pool entry that cannot be applied.
    MatcherCorruption,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Syntax => "syntax",
            Self::Lookup => "lookup",
            Self::Io => "io",
            Self::MatcherCorruption => "matcher corruption",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while evaluating, storing or matching fixtures.
#[derive(Error, Debug)]
pub enum HazyError {
    /// Malformed expression.
    #[error("[Hazy syntax error] {message}")]
    Syntax {
        /// Description of the problem.
        message: String,
    },

    /// Structural query that could not be compiled.
    #[error("[Hazy syntax error] invalid match pattern \"{pattern}\": {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Parser message.
        message: String,
    },

    /// Random data category that does not exist.
    #[error("Invalid random data category \"{category}\". Supported: {}", .supported.join(","))]
    UnknownCategory {
        /// Requested category.
        category: String,
        /// All valid categories.
        supported: Vec<String>,
    },

    /// Random data subtype that does not exist for its category.
    #[error("Invalid random data type \"{subtype}\". Supported: {}", render_list(.supported))]
    UnknownSubtype {
        /// Category the subtype was requested from.
        category: String,
        /// Requested subtype.
        subtype: String,
        /// Valid subtypes for the category.
        supported: Vec<String>,
    },

    /// Fixture file could not be read.
    #[error("Failed to read fixture file {path}: {source}")]
    FileRead {
        /// Resolved path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Fixture file contents did not parse after expression evaluation.
    #[error("Failed to parse fixture file {path}: {message}")]
    FixtureParse {
        /// Resolved path of the file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Glob pattern could not be expanded.
    #[error("Failed to expand fixture glob \"{pattern}\": {message}")]
    Glob {
        /// The glob pattern.
        pattern: String,
        /// Underlying message.
        message: String,
    },

    /// A file embed was requested without a path.
    #[error("Failed to read file, filepath required")]
    MissingFilePath,

    /// Matcher pool entry is not a callable rule.
    #[error("Match pattern \"{pattern}\" does not apply to fixture or handle is not a function")]
    MatcherCorruption {
        /// Pattern whose entry is corrupt.
        pattern: String,
    },

    /// `register_all` was given something other than a `{name: fixture}` map.
    #[error("Fixture map following {{name: fixture}} must be provided")]
    InvalidFixtureMap,

    /// Configuration file error.
    #[error("Invalid configuration in {path}: {message}")]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

impl HazyError {
    /// Creates a syntax error.
    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Returns the taxonomy class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } | Self::InvalidPattern { .. } | Self::InvalidFixtureMap => {
                ErrorKind::Syntax
            }
            Self::UnknownCategory { .. } | Self::UnknownSubtype { .. } => ErrorKind::Lookup,
            Self::FileRead { .. }
            | Self::FixtureParse { .. }
            | Self::Glob { .. }
            | Self::MissingFilePath
            | Self::Config { .. } => ErrorKind::Io,
            Self::MatcherCorruption { .. } => ErrorKind::MatcherCorruption,
        }
    }
}

fn render_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| items.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_display() {
        let err = HazyError::syntax("Cannot define an empty expression");
        assert_eq!(
            err.to_string(),
            "[Hazy syntax error] Cannot define an empty expression"
        );
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_unknown_subtype_lists_supported() {
        let err = HazyError::UnknownSubtype {
            category: "basic".to_string(),
            subtype: "doesnotexist".to_string(),
            supported: vec!["bool".to_string(), "integer".to_string()],
        };
        assert_eq!(
            err.to_string(),
            r#"Invalid random data type "doesnotexist". Supported: ["bool","integer"]"#
        );
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }

    #[test]
    fn test_unknown_category_lists_supported() {
        let err = HazyError::UnknownCategory {
            category: "nope".to_string(),
            supported: vec!["basic".to_string(), "text".to_string()],
        };
        assert!(err.to_string().contains("basic,text"));
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }

    #[test]
    fn test_io_kinds() {
        let err = HazyError::FileRead {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("missing.json"));
        assert_eq!(HazyError::MissingFilePath.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_matcher_corruption() {
        let err = HazyError::MatcherCorruption {
            pattern: "$.age".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::MatcherCorruption);
        assert!(err.to_string().contains("$.age"));
    }
}
