//! Structural fixture matchers.
//!
//! A matcher pool maps JSONPath patterns to rules. Whenever a fixture
//! contains a value at a rule's pattern, the rule's handler may replace the
//! whole fixture.
//!
//! # Examples
//!
//! ```rust
//! use hazy_engine::matcher::MatcherPool;
//! use serde_json::json;
//!
//! let mut pool = MatcherPool::new();
//! pool.register_rule("$.age", |fixture: &serde_json::Value, _: &[serde_json::Value], _: &str| {
//!     let mut fixture = fixture.clone();
//!     fixture["age"] = json!(99);
//!     fixture
//! })?;
//!
//! let result = pool.process_deep(&json!({"name": "Ada", "age": 36}), true)?;
//! assert_eq!(result["age"], 99);
//! # Ok::<(), hazy_core::HazyError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use hazy_core::value::is_truthy;
use hazy_core::{Fixture, HazyError, Result};
use indexmap::IndexMap;
use serde_json_path::JsonPath;
use tracing::{debug, warn};

/// Handler invoked with `(whole fixture, matched values, pattern)`.
///
/// The returned fixture replaces the whole input fixture.
pub type Handler = Arc<dyn Fn(&Fixture, &[Fixture], &str) -> Fixture + Send + Sync>;

/// A compiled structural query.
#[derive(Debug)]
pub struct StructuralQuery {
    pattern: String,
    path: JsonPath,
}

impl StructuralQuery {
    /// Compiles a JSONPath pattern.
    ///
    /// # Errors
    ///
    /// Returns [`HazyError::InvalidPattern`] if the pattern does not parse.
    pub fn compile(pattern: &str) -> Result<Self> {
        let path = JsonPath::parse(pattern).map_err(|e| HazyError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            path,
        })
    }

    /// Returns the source pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns every value the query selects. Scalars never match.
    #[must_use]
    pub fn select(&self, fixture: &Fixture) -> Vec<Fixture> {
        if !(fixture.is_object() || fixture.is_array()) {
            return Vec::new();
        }
        self.path.query(fixture).all().into_iter().cloned().collect()
    }
}

/// A pattern bound to a handler.
#[derive(Clone)]
pub struct MatcherRule {
    /// The pattern the rule was registered under.
    pub pattern: String,
    /// The handler to run on matching fixtures.
    pub handler: Handler,
}

impl fmt::Debug for MatcherRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherRule")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// What a pattern is associated with.
#[derive(Debug, Clone)]
pub enum MatcherEntry {
    /// Plain value association from [`MatcherPool::register`].
    Value(Fixture),
    /// Callable rule from [`MatcherPool::register_rule`].
    Rule(MatcherRule),
}

#[derive(Debug)]
struct Registered {
    query: StructuralQuery,
    entry: MatcherEntry,
}

/// Pattern-keyed pool of matcher entries, in registration order.
///
/// Cloning is cheap: entries are shared.
#[derive(Debug, Clone, Default)]
pub struct MatcherPool {
    entries: IndexMap<String, Arc<Registered>>,
}

impl MatcherPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a pattern with a plain value.
    ///
    /// Such entries still take part in [`matches`](Self::matches), but
    /// processing them fails with [`HazyError::MatcherCorruption`].
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn register(&mut self, pattern: &str, value: Fixture) -> Result<()> {
        let query = StructuralQuery::compile(pattern)?;
        self.entries.insert(
            pattern.to_string(),
            Arc::new(Registered {
                query,
                entry: MatcherEntry::Value(value),
            }),
        );
        Ok(())
    }

    /// Registers a rule, replacing any existing entry for the pattern.
    ///
    /// A replaced rule moves to the end of the iteration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn register_rule<F>(&mut self, pattern: &str, handler: F) -> Result<()>
    where
        F: Fn(&Fixture, &[Fixture], &str) -> Fixture + Send + Sync + 'static,
    {
        self.register_handler(pattern, Arc::new(handler))
    }

    /// Registers an already shared handler. See [`register_rule`](Self::register_rule).
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn register_handler(&mut self, pattern: &str, handler: Handler) -> Result<()> {
        let query = StructuralQuery::compile(pattern)?;
        self.entries.shift_remove(pattern);
        self.entries.insert(
            pattern.to_string(),
            Arc::new(Registered {
                query,
                entry: MatcherEntry::Rule(MatcherRule {
                    pattern: pattern.to_string(),
                    handler,
                }),
            }),
        );
        debug!(pattern, "Registered matcher rule");
        Ok(())
    }

    /// Returns the entry registered for a pattern.
    #[must_use]
    pub fn entry(&self, pattern: &str) -> Option<&MatcherEntry> {
        self.entries.get(pattern).map(|registered| &registered.entry)
    }

    /// Returns the registered patterns in iteration order.
    #[must_use]
    pub fn patterns(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Returns the number of registered patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no patterns are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Maps each pattern with at least one match in `fixture` to its matches.
    ///
    /// Returns an empty map when `enabled` is false.
    #[must_use]
    pub fn matches(&self, fixture: &Fixture, enabled: bool) -> IndexMap<String, Vec<Fixture>> {
        if !enabled {
            if !self.entries.is_empty() {
                warn!(
                    matchers = self.entries.len(),
                    "Matching is disabled, skipping matcher pool"
                );
            }
            return IndexMap::new();
        }

        self.entries
            .iter()
            .filter_map(|(pattern, registered)| {
                let found = registered.query.select(fixture);
                (!found.is_empty()).then(|| (pattern.clone(), found))
            })
            .collect()
    }

    /// Returns true if any registered pattern matches `fixture`.
    #[must_use]
    pub fn has_match(&self, fixture: &Fixture, enabled: bool) -> bool {
        !self.matches(fixture, enabled).is_empty()
    }

    /// Runs the rule for `pattern` against `fixture` and returns its result.
    ///
    /// A pattern with no entry leaves the fixture unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`HazyError::MatcherCorruption`] if the entry is not a rule.
    pub fn process(&self, pattern: &str, fixture: &Fixture) -> Result<Fixture> {
        let Some(registered) = self.entries.get(pattern) else {
            return Ok(fixture.clone());
        };

        match &registered.entry {
            MatcherEntry::Rule(rule) => {
                let matched = registered.query.select(fixture);
                Ok((rule.handler)(fixture, &matched, pattern))
            }
            MatcherEntry::Value(_) => Err(HazyError::MatcherCorruption {
                pattern: pattern.to_string(),
            }),
        }
    }

    /// Applies every matching rule to `fixture`.
    ///
    /// Each rule sees the original fixture; the latest truthy result wins.
    ///
    /// # Errors
    ///
    /// Returns an error if a matching entry is corrupt.
    pub fn process_deep(&self, fixture: &Fixture, enabled: bool) -> Result<Fixture> {
        let mut processed = fixture.clone();
        for pattern in self.matches(fixture, enabled).keys() {
            let result = self.process(pattern, fixture)?;
            if is_truthy(&result) {
                processed = result;
            }
        }
        Ok(processed)
    }

    /// Returns the fixtures that `pattern` matches, processed by the
    /// pattern's rule when `should_process` is true.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile or its entry is corrupt.
    pub fn search<I>(&self, pattern: &str, fixtures: I, should_process: bool) -> Result<Vec<Fixture>>
    where
        I: IntoIterator<Item = Fixture>,
    {
        let query = StructuralQuery::compile(pattern)?;
        fixtures
            .into_iter()
            .filter(|fixture| !query.select(fixture).is_empty())
            .map(|fixture| {
                if should_process {
                    self.process(pattern, &fixture)
                } else {
                    Ok(fixture)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazy_core::ErrorKind;
    use serde_json::json;
    use tracing_test::traced_test;

    fn force_age(fixture: &Fixture, _: &[Fixture], _: &str) -> Fixture {
        let mut fixture = fixture.clone();
        fixture["age"] = json!(99);
        fixture
    }

    #[test]
    fn test_compile_rejects_garbage() {
        let err = StructuralQuery::compile("$[").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_select_ignores_scalars() {
        let query = StructuralQuery::compile("$.age").unwrap();
        assert!(query.select(&json!(5)).is_empty());
        assert_eq!(query.select(&json!({"age": 5})), vec![json!(5)]);
    }

    #[test]
    fn test_matches_omits_non_matching() {
        let mut pool = MatcherPool::new();
        pool.register_rule("$.age", force_age).unwrap();
        pool.register_rule("$.email", force_age).unwrap();

        let found = pool.matches(&json!({"age": 1}), true);
        assert_eq!(found.len(), 1);
        assert_eq!(found["$.age"], vec![json!(1)]);
    }

    #[test]
    fn test_matches_disabled() {
        let mut pool = MatcherPool::new();
        pool.register_rule("$.age", force_age).unwrap();
        assert!(pool.matches(&json!({"age": 1}), false).is_empty());
        assert!(!pool.has_match(&json!({"age": 1}), false));
        assert!(pool.has_match(&json!({"age": 1}), true));
    }

    #[test]
    #[traced_test]
    fn test_disabled_matching_warns() {
        let mut pool = MatcherPool::new();
        assert!(pool.matches(&json!({"age": 1}), false).is_empty());
        assert!(!logs_contain("Matching is disabled"));

        pool.register_rule("$.age", force_age).unwrap();
        assert!(pool.matches(&json!({"age": 1}), false).is_empty());
        logs_assert(|lines: &[&str]| {
            lines
                .iter()
                .any(|line| line.contains("WARN") && line.contains("Matching is disabled"))
                .then_some(())
                .ok_or_else(|| "expected a warning for disabled matching".to_string())
        });
    }

    #[test]
    fn test_process_passes_matched_subset() {
        let mut pool = MatcherPool::new();
        pool.register_rule("$.users[*].name", |_: &Fixture, matched: &[Fixture], pattern: &str| {
            json!({"pattern": pattern, "names": matched})
        })
        .unwrap();

        let result = pool
            .process(
                "$.users[*].name",
                &json!({"users": [{"name": "a"}, {"name": "b"}]}),
            )
            .unwrap();
        assert_eq!(
            result,
            json!({"pattern": "$.users[*].name", "names": ["a", "b"]})
        );
    }

    #[test]
    fn test_process_unknown_pattern_is_identity() {
        let pool = MatcherPool::new();
        let fixture = json!({"a": 1});
        assert_eq!(pool.process("$.a", &fixture).unwrap(), fixture);
    }

    #[test]
    fn test_value_entry_is_corrupt() {
        let mut pool = MatcherPool::new();
        pool.register("$.age", json!("not a handler")).unwrap();
        let err = pool.process("$.age", &json!({"age": 1})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MatcherCorruption);

        let err = pool.process_deep(&json!({"age": 1}), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MatcherCorruption);
    }

    #[test]
    fn test_process_deep_uses_pristine_input_and_last_truthy_wins() {
        let mut pool = MatcherPool::new();
        pool.register_rule("$.a", |f: &Fixture, _: &[Fixture], _: &str| {
            let mut f = f.clone();
            f["first"] = json!(true);
            f
        })
        .unwrap();
        pool.register_rule("$.a", force_age).unwrap();
        pool.register_rule("$.b", |f: &Fixture, _: &[Fixture], _: &str| {
            let mut f = f.clone();
            f["second"] = json!(true);
            f
        })
        .unwrap();
        pool.register_rule("$.c", |_: &Fixture, _: &[Fixture], _: &str| Fixture::Null)
            .unwrap();

        let result = pool
            .process_deep(&json!({"a": 1, "b": 2, "c": 3}), true)
            .unwrap();

        // `$.a` was replaced by force_age, `$.b` ran last against the
        // original and the falsy `$.c` result was ignored.
        assert_eq!(result, json!({"a": 1, "b": 2, "c": 3, "second": true}));
    }

    #[test]
    fn test_register_rule_moves_pattern_to_end() {
        let mut pool = MatcherPool::new();
        pool.register_rule("$.a", force_age).unwrap();
        pool.register_rule("$.b", force_age).unwrap();
        pool.register_rule("$.a", force_age).unwrap();
        assert_eq!(pool.patterns(), vec!["$.b".to_string(), "$.a".to_string()]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_search_filters_and_processes() {
        let mut pool = MatcherPool::new();
        pool.register_rule("$.age", force_age).unwrap();
        let fixtures = vec![json!({"age": 1}), json!({"name": "x"}), json!([1, 2])];

        let raw = pool.search("$.age", fixtures.clone(), false).unwrap();
        assert_eq!(raw, vec![json!({"age": 1})]);

        let processed = pool.search("$.age", fixtures, true).unwrap();
        assert_eq!(processed, vec![json!({"age": 99})]);
    }

    #[test]
    fn test_clear() {
        let mut pool = MatcherPool::new();
        pool.register("$.x", json!(1)).unwrap();
        assert!(!pool.is_empty());
        pool.clear();
        assert!(pool.is_empty());
        assert!(pool.entry("$.x").is_none());
    }
}
