//! Memoization for repeated fixture lookups.
//!
//! Backs the `lazy_*` lookups on [`Hazy`](crate::Hazy). Entries are
//! dropped whenever the data they were computed from may have changed.

use std::collections::HashMap;

use hazy_core::Fixture;
use parking_lot::Mutex;

/// Which lookup produced a cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// Result of `get`, absence included.
    Get,
    /// Result of `find`.
    Find,
}

/// Version of the cache a lookup started from.
///
/// Taken before computing a result and handed back to
/// [`LookupCache::put`], which refuses the result if `name` was invalidated
/// in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    epoch: u64,
    version: u64,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<(Lookup, String), Option<Fixture>>,
    /// Bumped by `clear`.
    epoch: u64,
    /// Bumped per name by `invalidate`.
    versions: HashMap<String, u64>,
}

impl State {
    fn stamp(&self, name: &str) -> Stamp {
        Stamp {
            epoch: self.epoch,
            version: self.versions.get(name).copied().unwrap_or_default(),
        }
    }
}

/// Thread-safe lookup cache keyed by lookup kind and name.
#[derive(Debug, Default)]
pub struct LookupCache {
    state: Mutex<State>,
}

impl LookupCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result, if any. The inner `None` is a cached miss.
    #[must_use]
    pub fn get(&self, lookup: Lookup, name: &str) -> Option<Option<Fixture>> {
        self.state
            .lock()
            .entries
            .get(&(lookup, name.to_string()))
            .cloned()
    }

    /// Returns the current stamp for `name`.
    #[must_use]
    pub fn stamp(&self, name: &str) -> Stamp {
        self.state.lock().stamp(name)
    }

    /// Stores a result computed since `stamp` was taken.
    ///
    /// Returns false, storing nothing, if `name` was invalidated or the
    /// cache cleared after `stamp`.
    pub fn put(&self, stamp: Stamp, lookup: Lookup, name: &str, result: Option<Fixture>) -> bool {
        let mut state = self.state.lock();
        if state.stamp(name) != stamp {
            return false;
        }
        state.entries.insert((lookup, name.to_string()), result);
        true
    }

    /// Drops every result cached for `name`.
    pub fn invalidate(&self, name: &str) {
        let mut state = self.state.lock();
        state.entries.retain(|(_, cached), _| cached != name);
        *state.versions.entry(name.to_string()).or_default() += 1;
    }

    /// Drops every result.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        if !state.entries.is_empty() {
            tracing::debug!(entries = state.entries.len(), "Lookup cache cleared");
        }
        state.entries.clear();
        state.versions.clear();
        state.epoch += 1;
    }

    /// Returns the number of cached results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}
