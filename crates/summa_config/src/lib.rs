//! Parsing and validation of `summa.toml` summary-cache configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`SummaConfig`] holding the storage location and the unit-name filter used
//! by the persistent summary cache.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
