//! Configuration types deserialized from `summa.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Pattern used when no `filter` is configured: the conventional program entry point.
pub const DEFAULT_SUMMARY_FILTER: &str = r"Main\.main";

/// The top-level configuration parsed from `summa.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct SummaConfig {
    /// Settings for the persistent summary cache.
    #[serde(default)]
    pub summary_cache: SummaryCacheConfig,
}

/// Settings for the persistent summary cache.
///
/// Persistence is opt-in: with no `file` (or an empty one) both loading and
/// persisting are no-ops and every summary is computed from scratch.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryCacheConfig {
    /// Path of the summary container file. Empty disables persistence.
    #[serde(default)]
    pub file: PathBuf,
    /// Regular expression matched against the full qualified name of a unit
    /// to decide whether its summary is worth persisting.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Number of worker threads used for post-hit graph reconstruction.
    /// `0` lets the thread pool pick its default.
    #[serde(default)]
    pub reconstruction_threads: usize,
}

fn default_filter() -> String {
    DEFAULT_SUMMARY_FILTER.to_string()
}

impl Default for SummaryCacheConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            filter: default_filter(),
            reconstruction_threads: 0,
        }
    }
}

impl SummaryCacheConfig {
    /// Creates a configuration persisting to `file` with the given filter.
    pub fn new(file: impl Into<PathBuf>, filter: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            filter: filter.into(),
            reconstruction_threads: 0,
        }
    }

    /// Returns the storage location, or `None` when persistence is disabled.
    pub fn storage_path(&self) -> Option<&Path> {
        if self.file.as_os_str().is_empty() {
            None
        } else {
            Some(&self.file)
        }
    }
}
