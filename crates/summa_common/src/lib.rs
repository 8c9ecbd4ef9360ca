//! Shared foundational types used across the summary cache workspace.
//!
//! This crate provides the content fingerprint used both to validate cached
//! summaries against the current program and to checksum persisted containers.

#![warn(missing_docs)]

pub mod fingerprint;

pub use fingerprint::{Fingerprint, FingerprintBuilder};
