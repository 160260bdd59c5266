//! # Hazy Core
//!
//! Core types for the Hazy fixture engine.
//!
//! This crate provides the foundational pieces shared by the engine and
//! test helpers:
//!
//! - [`Fixture`] - the JSON-shaped fixture value and its helpers
//! - [`HazyError`] - the error taxonomy, classified by [`ErrorKind`]
//! - [`Config`] - seed, matching and file-resolution settings
//! - [`RandomGenerator`] - the catalog of random data categories
//!
//! ## Example
//!
//! ```rust
//! use hazy_core::{Config, RandomGenerator};
//!
//! let config = Config::new().with_seed(42);
//! let random = RandomGenerator::with_seed(config.seed);
//!
//! let name = random.generate("person:name").unwrap();
//! assert!(name.is_string());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod random;
pub mod value;


pub use config::{Config, ErrorConfig, MatcherConfig};
pub use error::{ErrorKind, HazyError, Result};
pub use random::{Category, FakeProvider, RandomGenerator, RandomProvider, RandomSpec};
pub use value::{Fixture, FixtureFormat};
