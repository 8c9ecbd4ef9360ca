//! Fingerprints of analyzed units and of persisted summary containers.
//!
//! A summary is only reused when the fingerprint recorded next to it equals
//! the fingerprint of the unit as loaded now. The same value type checksums
//! the payload of a container file.

use serde::{Deserialize, Serialize};
use std::fmt;

use xxhash_rust::xxh3::{xxh3_128, Xxh3};

/// XXH3-128 digest of whatever content a hashing strategy considers
/// behavior-relevant for a unit (body bytes, signature, flags).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Recorded by strategies that never compare fingerprints.
    pub const ZERO: Fingerprint = Fingerprint([0; 16]);

    /// Fingerprints a single contiguous byte string.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxh3_128(data).to_le_bytes())
    }

    /// The digest in little-endian order.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// `true` for [`Fingerprint::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 16]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

// Short form for per-entry log lines.
impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, ..] = self.0;
        write!(f, "fp:{a:02x}{b:02x}{c:02x}{d:02x}")
    }
}

/// Incremental builder for fingerprints over several content parts.
///
/// Each part is length-prefixed before being fed to the hasher so that
/// `["ab", "c"]` and `["a", "bc"]` produce different fingerprints.
pub struct FingerprintBuilder {
    hasher: Xxh3,
}

impl FingerprintBuilder {
    /// Creates a builder with an empty hasher state.
    pub fn new() -> Self {
        Self {
            hasher: Xxh3::new(),
        }
    }

    /// Feeds one content part into the fingerprint.
    pub fn part(mut self, data: &[u8]) -> Self {
        self.hasher.update(&(data.len() as u64).to_le_bytes());
        self.hasher.update(data);
        self
    }

    /// Finalizes the fingerprint.
    pub fn finish(self) -> Fingerprint {
        Fingerprint(self.hasher.digest128().to_le_bytes())
    }
}

impl Default for FingerprintBuilder {
    fn default() -> Self {
        Self::new()
    }
}
