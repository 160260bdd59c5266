//! The fixture value model.
//!
//! A fixture is any JSON-shaped tree, so [`Fixture`] is simply
//! [`serde_json::Value`]. The helpers here give every component the same
//! notion of truthiness, textual substitution and property access.

use std::path::Path;

use serde_json::Value;

/// A tree-shaped fixture value.
pub type Fixture = Value;

/// Returns `false` for null, `false`, numeric zero and the empty string.
///
/// Arrays and objects are always truthy, even when empty.
///
/// # Examples
///
/// ```
/// use hazy_core::value::is_truthy;
/// use serde_json::json;
///
/// assert!(is_truthy(&json!({})));
/// assert!(!is_truthy(&json!(0)));
/// assert!(!is_truthy(&json!("")));
/// ```
#[must_use]
pub fn is_truthy(value: &Fixture) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Returns true for values that are substituted textually into a string.
#[must_use]
pub const fn is_scalar_text(value: &Fixture) -> bool {
    matches!(value, Value::String(_) | Value::Number(_))
}

/// Renders a string or number for substitution. Other values use their
/// JSON form.
#[must_use]
pub fn to_text(value: &Fixture) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads `key` from `value`.
///
/// Objects are indexed by key, arrays by a non-negative integer key, and
/// strings and arrays also answer `length`. Anything else is absent.
#[must_use]
pub fn property(value: &Fixture, key: &str) -> Option<Fixture> {
    match value {
        Value::Object(map) => map.get(key).cloned(),
        Value::Array(items) => {
            if key == "length" {
                return Some(Value::from(items.len()));
            }
            key.parse::<usize>()
                .ok()
                .and_then(|index| items.get(index).cloned())
        }
        Value::String(s) if key == "length" => Some(Value::from(s.chars().count())),
        Value::String(s) => key
            .parse::<usize>()
            .ok()
            .and_then(|index| s.chars().nth(index))
            .map(|c| Value::String(c.to_string())),
        _ => None,
    }
}

/// On-disk format of a fixture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFormat {
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
}

impl FixtureFormat {
    /// Picks the format from a file extension, defaulting to JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }

    /// Parses text in this format into a fixture.
    ///
    /// # Errors
    ///
    /// Returns the parser's message if the text is not a valid document.
    pub fn parse(self, text: &str) -> std::result::Result<Fixture, String> {
        match self {
            Self::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}
