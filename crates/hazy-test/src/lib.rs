//! # Hazy Test
//!
//! Helpers for testing code built on Hazy fixtures.
//!
//! - [`FixtureDir`] - temporary fixture root with JSON/YAML writers
//! - [`handlers`] - ready-made matcher handlers
//! - [`assertions`] - assertion helpers for fixtures and errors
//! - [`init_tracing`] - opt-in log output for tests
//!
//! ## Example
//!
//! ```rust
//! use hazy_test::FixtureDir;
//! use serde_json::json;
//!
//! let dir = FixtureDir::new()?;
//! dir.write_json("users/ada.json", &json!({"name": "Ada"}))?;
//!
//! let config = dir.config();
//! assert!(config.resolve("users/ada.json").exists());
//! # Ok::<(), std::io::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assertions;
pub mod dir;
pub mod handlers;

pub use assertions::{assert_error_kind, assert_has_keys, assert_same_shape};
pub use dir::FixtureDir;
pub use handlers::{replace_with, set_field, tag_pattern};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a formatting subscriber for the current test binary.
///
/// The filter comes from `RUST_LOG`, defaulting to `hazy=debug`. Calling
/// it more than once is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hazy=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
