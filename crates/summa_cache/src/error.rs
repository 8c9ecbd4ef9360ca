//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// None of these is fatal to analysis. A failed load leaves the store empty
/// and every summary is computed from scratch; a failed persist only loses
/// the speedup for the next run.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing the container.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The container has an invalid or missing header.
    #[error("invalid container header in {path}: {reason}")]
    InvalidHeader {
        /// The container file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the computed checksum of the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The container file path.
        path: PathBuf,
        /// The expected checksum from the header.
        expected: String,
        /// The actual checksum computed from the payload.
        actual: String,
    },

    /// The container format version does not match the current version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The container file path.
        path: PathBuf,
        /// The expected format version.
        expected: u32,
        /// The actual format version found in the file.
        actual: u32,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The unit-name filter is not a valid regular expression.
    #[error("invalid summary filter '{pattern}': {reason}")]
    InvalidFilter {
        /// The offending pattern.
        pattern: String,
        /// Description of the regex compilation failure.
        reason: String,
    },

    /// The reconstruction executor could not be created.
    #[error("failed to start reconstruction executor: {reason}")]
    Executor {
        /// Description of the failure.
        reason: String,
    },
}
