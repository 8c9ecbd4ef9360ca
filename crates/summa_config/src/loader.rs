//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::SummaConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "summa.toml";

/// Loads and validates a `summa.toml` configuration from a project directory.
///
/// A missing file yields the default configuration, which disables
/// persistence. Any other read failure is reported as an error.
pub fn load_config(project_dir: &Path) -> Result<SummaConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SummaConfig::default()),
        Err(e) => return Err(e.into()),
    };
    load_config_from_str(&content)
}

/// Parses and validates a `summa.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<SummaConfig, ConfigError> {
    let config: SummaConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that the filter pattern compiles.
fn validate_config(config: &SummaConfig) -> Result<(), ConfigError> {
    let pattern = &config.summary_cache.filter;
    regex::Regex::new(pattern).map_err(|e| ConfigError::InvalidFilter {
        pattern: pattern.clone(),
        reason: e.to_string(),
    })?;
    Ok(())
}
