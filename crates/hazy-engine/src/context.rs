//! The [`Hazy`] context: fixture pool, matcher pool and configuration.
//!
//! Every operation takes `&self`. Locks are only held while copying data in
//! or out of the pools, never while evaluating expressions or running
//! matcher handlers, so evaluation can call back into the same context.

use std::sync::Arc;

use hazy_core::{Config, Fixture, HazyError, RandomGenerator, RandomProvider, Result};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::cache::{Lookup, LookupCache};
use crate::lang::{Lang, Scope};
use crate::loader::{self, GlobReport};
use crate::matcher::{Handler, MatcherPool};
use crate::pool::FixturePool;
use crate::processor::Processor;

#[derive(Debug, Clone)]
struct RandomState {
    generator: RandomGenerator,
    custom: bool,
}

impl RandomState {
    fn seeded(seed: Option<u64>) -> Self {
        Self {
            generator: RandomGenerator::with_seed(seed),
            custom: false,
        }
    }
}

/// A fixture processing context.
///
/// # Examples
///
/// ```
/// use hazy_core::Config;
/// use hazy_engine::Hazy;
/// use serde_json::json;
///
/// let hazy = Hazy::with_config(Config::new().with_seed(1));
/// hazy.register("user", json!({"name": "|~person:first|", "age": "|~basic:integer|"}))?;
///
/// let user = hazy.get("user")?.expect("registered");
/// assert!(user["name"].is_string());
/// assert!(user["age"].as_str().is_some_and(|age| age.parse::<i64>().is_ok()));
/// # Ok::<(), hazy_core::HazyError>(())
/// ```
#[derive(Debug)]
pub struct Hazy {
    config: RwLock<Config>,
    random: RwLock<RandomState>,
    fixtures: RwLock<FixturePool>,
    matchers: RwLock<MatcherPool>,
    cache: LookupCache,
}

impl Default for Hazy {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl Hazy {
    /// Creates a context with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context with the given configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            random: RwLock::new(RandomState::seeded(config.seed)),
            config: RwLock::new(config),
            fixtures: RwLock::new(FixturePool::new()),
            matchers: RwLock::new(MatcherPool::new()),
            cache: LookupCache::new(),
        }
    }

    /// Creates a context whose `~` expressions use `provider`.
    #[must_use]
    pub fn with_provider(config: Config, provider: Arc<dyn RandomProvider>) -> Self {
        let hazy = Self::with_config(config);
        hazy.set_random_provider(provider);
        hazy
    }

    /// Returns an independent copy of this context.
    ///
    /// Pools and configuration are copied. A seeded default provider is
    /// re-created from its seed; a custom provider is shared.
    #[must_use]
    pub fn fork(&self) -> Self {
        let config = self.config();
        let random = {
            let random = self.random.read();
            if random.custom {
                random.clone()
            } else {
                RandomState::seeded(config.seed)
            }
        };

        Self {
            config: RwLock::new(config),
            random: RwLock::new(random),
            fixtures: RwLock::new(self.fixtures.read().clone()),
            matchers: RwLock::new(self.matchers.read().clone()),
            cache: LookupCache::new(),
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Replaces the configuration.
    ///
    /// A changed seed re-seeds the default provider. Cached lookups are
    /// dropped.
    pub fn set_config(&self, config: Config) {
        let reseed = {
            let mut current = self.config.write();
            let changed = current.seed != config.seed;
            *current = config;
            changed.then_some(current.seed)
        };

        if let Some(seed) = reseed {
            let mut random = self.random.write();
            if !random.custom {
                *random = RandomState::seeded(seed);
                debug!(?seed, "Re-seeded random provider");
            }
        }
        self.cache.clear();
    }

    /// Edits the configuration in place. See [`set_config`](Self::set_config).
    pub fn update_config(&self, edit: impl FnOnce(&mut Config)) {
        let mut config = self.config();
        edit(&mut config);
        self.set_config(config);
    }

    /// Replaces the random value provider.
    pub fn set_random_provider(&self, provider: Arc<dyn RandomProvider>) {
        *self.random.write() = RandomState {
            generator: RandomGenerator::new(provider),
            custom: true,
        };
    }

    /// Returns the random generator `~` expressions use.
    #[must_use]
    pub fn random(&self) -> RandomGenerator {
        self.random.read().generator.clone()
    }

    fn matching_enabled(&self) -> bool {
        self.config.read().matcher.enabled
    }

    // ------------------------------------------------------------------
    // Fixture pool
    // ------------------------------------------------------------------

    /// Processes `fixture` and stores it under `name`, replacing any
    /// previous fixture of that name.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while processing the fixture.
    #[instrument(skip(self, fixture))]
    pub fn register(&self, name: &str, fixture: Fixture) -> Result<()> {
        self.store(name, &fixture).map(drop)
    }

    /// Registers every entry of a `{name: fixture}` object.
    ///
    /// # Errors
    ///
    /// Returns [`HazyError::InvalidFixtureMap`] if `fixtures` is not an
    /// object, or the first registration error.
    pub fn register_all(&self, fixtures: Fixture) -> Result<()> {
        let Fixture::Object(map) = fixtures else {
            return Err(HazyError::InvalidFixtureMap);
        };
        let count = map.len();
        for (name, fixture) in map {
            self.register(&name, fixture)?;
        }
        info!(count, "Registered fixtures");
        Ok(())
    }

    fn store(&self, name: &str, fixture: &Fixture) -> Result<Fixture> {
        let processed = self.process(fixture)?;
        let replaced = self
            .fixtures
            .write()
            .insert(name, processed.clone())
            .is_some();
        self.cache.invalidate(name);
        debug!(name, replaced, "Registered fixture");
        Ok(processed)
    }

    /// Returns the fixture stored under `name`.
    ///
    /// When matching is enabled the matcher pool is applied to the copy
    /// that is returned; the stored fixture is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a matcher entry is corrupt.
    pub fn get(&self, name: &str) -> Result<Option<Fixture>> {
        let stored = self.fixtures.read().get(name).cloned();
        stored.map(|fixture| self.process_deep(&fixture)).transpose()
    }

    /// Returns the fixture stored under `name`, loading `<name>.json` from
    /// the fixture root if none is registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the fallback file cannot be loaded.
    pub fn find(&self, name: &str) -> Result<Fixture> {
        if let Some(fixture) = self.get(name)? {
            return Ok(fixture);
        }
        self.src(&format!("{name}.json"))
    }

    /// Memoized [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn lazy_get(&self, name: &str) -> Result<Option<Fixture>> {
        if let Some(hit) = self.cache.get(Lookup::Get, name) {
            return Ok(hit);
        }
        let stamp = self.cache.stamp(name);
        let result = self.get(name)?;
        if !self.cache.put(stamp, Lookup::Get, name, result.clone()) {
            debug!(name, "Fixture changed during lookup, result not cached");
        }
        Ok(result)
    }

    /// Memoized [`find`](Self::find).
    ///
    /// # Errors
    ///
    /// See [`find`](Self::find).
    pub fn lazy_find(&self, name: &str) -> Result<Fixture> {
        if let Some(Some(hit)) = self.cache.get(Lookup::Find, name) {
            return Ok(hit);
        }
        let stamp = self.cache.stamp(name);
        let fixture = self.find(name)?;
        if !self.cache.put(stamp, Lookup::Find, name, Some(fixture.clone())) {
            debug!(name, "Fixture changed during lookup, result not cached");
        }
        Ok(fixture)
    }

    /// Returns the number of memoized lookups.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Returns every stored fixture in registration order, as [`get`](Self::get)
    /// would return it.
    ///
    /// # Errors
    ///
    /// Returns an error if a matcher entry is corrupt.
    pub fn all(&self) -> Result<Vec<Fixture>> {
        let fixtures = self.fixtures.read().snapshot();
        fixtures.iter().map(|fixture| self.process_deep(fixture)).collect()
    }

    /// Returns the registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.fixtures.read().names()
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fixtures.read().contains(name)
    }

    /// Returns the number of registered fixtures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fixtures.read().len()
    }

    /// Returns true if no fixture is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixtures.read().is_empty()
    }

    /// Returns the registered fixtures that `pattern` matches, processed
    /// by the pattern's rule when matching is enabled.
    ///
    /// # Errors
    ///
    /// See [`search`](Self::search).
    pub fn query(&self, pattern: &str) -> Result<Vec<Fixture>> {
        self.search(pattern, None)
    }

    /// Removes a fixture.
    pub fn remove(&self, name: &str) -> Option<Fixture> {
        let removed = self.fixtures.write().remove(name);
        self.cache.invalidate(name);
        removed
    }

    /// Removes every fixture.
    pub fn remove_all(&self) {
        self.fixtures.write().clear();
        self.cache.clear();
        info!("Removed all fixtures");
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Evaluates every string in `fixture`.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error.
    pub fn process(&self, fixture: &Fixture) -> Result<Fixture> {
        Processor::new(self).process(fixture)
    }

    /// Evaluates every string in `fixture`, then applies the matcher pool
    /// if `apply_matchers` is set and matching is enabled.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation or matcher error.
    pub fn process_with(&self, fixture: &Fixture, apply_matchers: bool) -> Result<Fixture> {
        let processed = self.process(fixture)?;
        if apply_matchers {
            self.process_deep(&processed)
        } else {
            Ok(processed)
        }
    }

    /// Processes each fixture in turn.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error.
    pub fn process_all(&self, fixtures: &[Fixture]) -> Result<Vec<Fixture>> {
        fixtures.iter().map(|fixture| self.process(fixture)).collect()
    }

    /// Evaluates the expressions in a single string.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error.
    pub fn evaluate(&self, text: &str) -> Result<Fixture> {
        Lang::new(self).process(text)
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Loads a fixture file and registers it under `path` as given.
    ///
    /// The raw file text is evaluated before it is parsed, so expressions
    /// may appear anywhere in the document, including unquoted value
    /// positions. `.yaml`/`.yml` files are parsed as YAML, anything else as
    /// JSON. Relative paths resolve against the configured root.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty, or if the file cannot be
    /// read, evaluated or parsed.
    #[instrument(skip(self))]
    pub fn src(&self, path: &str) -> Result<Fixture> {
        if path.trim().is_empty() {
            return Err(HazyError::MissingFilePath);
        }

        let resolved = self.config.read().resolve(path);
        let raw = loader::read_source(&resolved)?;
        let text = Lang::new(self).render(&raw)?;
        let fixture = loader::parse_source(&resolved, &text)?;
        let stored = self.store(path, &fixture)?;

        info!(path, resolved = %resolved.display(), "Loaded fixture file");
        Ok(stored)
    }

    /// Loads every file matching a glob pattern under the fixture root.
    ///
    /// Files load in path order and register under their root-relative
    /// path. The first failure aborts the batch; fixtures loaded before it
    /// stay registered.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed pattern or the first file that
    /// fails to load.
    pub fn glob(&self, pattern: &str) -> Result<Vec<Fixture>> {
        let root = self.config.read().root.clone();
        let fixtures = loader::expand(&root, pattern)?
            .iter()
            .map(|path| self.src(&path.to_string_lossy()))
            .collect::<Result<Vec<_>>>()?;

        info!(pattern, count = fixtures.len(), "Loaded fixture glob");
        Ok(fixtures)
    }

    /// Like [`glob`](Self::glob) but keeps going past failing files and
    /// reports them.
    ///
    /// # Errors
    ///
    /// Returns an error only for a malformed pattern.
    pub fn glob_lenient(&self, pattern: &str) -> Result<GlobReport> {
        let root = self.config.read().root.clone();
        let mut report = GlobReport::default();

        for path in loader::expand(&root, pattern)? {
            let name = path.to_string_lossy().into_owned();
            match self.src(&name) {
                Ok(fixture) => report.loaded.push((name, fixture)),
                Err(e) => {
                    warn!(path = %name, error = %e, "Skipping fixture file");
                    report.failed.push((name, e));
                }
            }
        }

        info!(
            pattern,
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Loaded fixture glob"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Matchers
    // ------------------------------------------------------------------

    /// Associates a pattern with a plain value.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn register_matcher(&self, pattern: &str, value: Fixture) -> Result<()> {
        self.matchers.write().register(pattern, value)?;
        self.cache.clear();
        Ok(())
    }

    /// Registers a matcher rule, replacing any entry for the pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn register_rule<F>(&self, pattern: &str, handler: F) -> Result<()>
    where
        F: Fn(&Fixture, &[Fixture], &str) -> Fixture + Send + Sync + 'static,
    {
        self.register_handler(pattern, Arc::new(handler))
    }

    /// Registers a shared matcher handler. See [`register_rule`](Self::register_rule).
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    #[instrument(skip(self, handler))]
    pub fn register_handler(&self, pattern: &str, handler: Handler) -> Result<()> {
        self.matchers.write().register_handler(pattern, handler)?;
        self.cache.clear();
        Ok(())
    }

    /// Returns the registered matcher patterns in iteration order.
    #[must_use]
    pub fn matcher_patterns(&self) -> Vec<String> {
        self.matchers.read().patterns()
    }

    /// Removes every matcher.
    pub fn clear_matchers(&self) {
        self.matchers.write().clear();
        self.cache.clear();
    }

    /// Maps each matching pattern to the values it selects in `fixture`.
    #[must_use]
    pub fn matches(&self, fixture: &Fixture) -> IndexMap<String, Vec<Fixture>> {
        let enabled = self.matching_enabled();
        self.matcher_snapshot().matches(fixture, enabled)
    }

    /// Returns true if any matcher pattern matches `fixture`.
    #[must_use]
    pub fn has_match(&self, fixture: &Fixture) -> bool {
        !self.matches(fixture).is_empty()
    }

    /// Runs the rule registered for `pattern` against `fixture`.
    ///
    /// # Errors
    ///
    /// Returns [`HazyError::MatcherCorruption`] if the entry is not a rule.
    pub fn process_match(&self, pattern: &str, fixture: &Fixture) -> Result<Fixture> {
        self.matcher_snapshot().process(pattern, fixture)
    }

    /// Applies every matching rule to `fixture`. Each rule sees the
    /// original fixture and the latest truthy result wins.
    ///
    /// # Errors
    ///
    /// Returns an error if a matching entry is corrupt.
    pub fn process_deep(&self, fixture: &Fixture) -> Result<Fixture> {
        let enabled = self.matching_enabled();
        self.matcher_snapshot().process_deep(fixture, enabled)
    }

    /// Returns the registered fixtures that `pattern` matches.
    ///
    /// Results go through the pattern's rule when `should_process` is
    /// true, or when it is `None` and matching is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile or its entry is
    /// corrupt.
    #[instrument(skip(self))]
    pub fn search(&self, pattern: &str, should_process: Option<bool>) -> Result<Vec<Fixture>> {
        let should_process = should_process.unwrap_or_else(|| self.matching_enabled());
        let fixtures = self.fixtures.read().snapshot();
        let found = self
            .matcher_snapshot()
            .search(pattern, fixtures, should_process)?;
        debug!(pattern, found = found.len(), "Searched fixture pool");
        Ok(found)
    }

    fn matcher_snapshot(&self) -> MatcherPool {
        self.matchers.read().clone()
    }
}

impl Scope for Hazy {
    fn random(&self, operand: &str) -> Result<Fixture> {
        self.random().generate(operand)
    }

    fn embed(&self, name: &str) -> Result<Option<Fixture>> {
        self.get(name)
    }

    fn query(&self, pattern: &str) -> Result<Vec<Fixture>> {
        self.search(pattern, None)
    }

    fn file(&self, path: &str) -> Result<Fixture> {
        self.src(path)
    }

    fn find(&self, name: &str) -> Result<Fixture> {
        Self::find(self, name)
    }

    fn trace_expressions(&self) -> bool {
        self.config.read().debug
    }
}
