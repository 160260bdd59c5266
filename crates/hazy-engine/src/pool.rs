//! Name-keyed storage for processed fixtures.

use hazy_core::Fixture;
use indexmap::IndexMap;

/// Fixtures by name, in registration order.
///
/// Re-registering a name replaces its fixture but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct FixturePool {
    fixtures: IndexMap<String, Fixture>,
}

impl FixturePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fixture, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, fixture: Fixture) -> Option<Fixture> {
        self.fixtures.insert(name.into(), fixture)
    }

    /// Returns the stored fixture for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Fixture> {
        self.fixtures.get(name)
    }

    /// Returns true if `name` is stored.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fixtures.contains_key(name)
    }

    /// Removes `name`, keeping the order of the remaining fixtures.
    pub fn remove(&mut self, name: &str) -> Option<Fixture> {
        self.fixtures.shift_remove(name)
    }

    /// Removes every fixture.
    pub fn clear(&mut self) {
        self.fixtures.clear();
    }

    /// Returns the stored names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.fixtures.keys().cloned().collect()
    }

    /// Returns a copy of every fixture in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Fixture> {
        self.fixtures.values().cloned().collect()
    }

    /// Returns the number of stored fixtures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}
