//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `summa.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// The unit-name filter is not a valid regular expression.
    #[error("invalid summary filter '{pattern}': {reason}")]
    InvalidFilter {
        /// The offending pattern.
        pattern: String,
        /// Description of the regex compilation failure.
        reason: String,
    },
}
