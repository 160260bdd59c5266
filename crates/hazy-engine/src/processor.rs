//! Recursive fixture processing.

use hazy_core::value::to_text;
use hazy_core::{Fixture, Result};
use serde_json::Map;

use crate::lang::{Lang, Scope};

/// Walks a fixture tree and evaluates every string in it.
///
/// Object keys are evaluated too. A key that evaluates to something other
/// than a string is stored under its JSON text; when two keys evaluate to
/// the same text the later one wins.
#[derive(Debug)]
pub struct Processor<'a, S: Scope + ?Sized> {
    lang: Lang<'a, S>,
}

impl<'a, S: Scope + ?Sized> Processor<'a, S> {
    /// Creates a processor that resolves lookups through `scope`.
    pub const fn new(scope: &'a S) -> Self {
        Self {
            lang: Lang::new(scope),
        }
    }

    /// Returns a processed copy of `fixture`.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error.
    pub fn process(&self, fixture: &Fixture) -> Result<Fixture> {
        match fixture {
            Fixture::String(text) => self.lang.process(text),
            Fixture::Array(items) => items
                .iter()
                .map(|item| self.process(item))
                .collect::<Result<Vec<_>>>()
                .map(Fixture::Array),
            Fixture::Object(map) => {
                let mut processed = Map::with_capacity(map.len());
                for (key, value) in map {
                    let key = to_text(&self.lang.process(key)?);
                    processed.insert(key, self.process(value)?);
                }
                Ok(Fixture::Object(processed))
            }
            scalar => Ok(scalar.clone()),
        }
    }
}
