//! # Hazy Engine
//!
//! Fixture expression language, fixture pool and structural matchers.
//!
//! This crate provides functionality for:
//!
//! - Evaluating `|<op><operand>|` expressions embedded in strings
//! - Processing whole fixture trees, keys included
//! - Registering fixtures by name and loading them from JSON/YAML files
//! - Rewriting fixtures with JSONPath-keyed matcher rules
//!
//! Everything hangs off a [`Hazy`] context, which owns the pools and the
//! configuration and can be shared between threads.
//!
//! ## Example
//!
//! ```rust
//! use hazy_core::Config;
//! use hazy_engine::Hazy;
//! use serde_json::{json, Value};
//!
//! let hazy = Hazy::with_config(Config::new().with_seed(42));
//!
//! hazy.register("address", json!({"city": "|~geo:city|"}))?;
//! hazy.register("user", json!({
//!     "name": "|~person:name|",
//!     "city": "|+address||:city|",
//! }))?;
//!
//! hazy.register_rule("$.name", |fixture: &Value, _: &[Value], _: &str| {
//!     let mut fixture = fixture.clone();
//!     fixture["verified"] = json!(true);
//!     fixture
//! })?;
//!
//! let user = hazy.get("user")?.expect("registered");
//! assert!(user["city"].is_string());
//! assert_eq!(user["verified"], true);
//! # Ok::<(), hazy_core::HazyError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod context;
pub mod lang;
pub mod loader;
pub mod matcher;
pub mod pool;
pub mod processor;

pub use context::Hazy;
pub use lang::{tokenize, Expression, Lang, Operator, Scope, Segment};
pub use loader::GlobReport;
pub use matcher::{Handler, MatcherEntry, MatcherPool, MatcherRule, StructuralQuery};
pub use pool::FixturePool;
pub use processor::Processor;
