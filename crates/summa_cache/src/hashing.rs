//! Validity fingerprints for cached summaries.
//!
//! A summary loaded from a previous run is only reused when the unit's
//! current fingerprint equals the one recorded alongside the summary.

use summa_common::{Fingerprint, FingerprintBuilder};

use crate::model::{Origin, PersistedSummary, ProgramModel, Summary};

/// Produces and checks validity fingerprints for units.
///
/// Implementations must be deterministic for a given program snapshot and
/// must yield a different fingerprint whenever anything the summary depends
/// on changes (body, signature, or declaring context).
pub trait HashingStrategy<P: ProgramModel>: Send + Sync {
    /// Computes the current fingerprint of `unit`.
    fn fingerprint(&self, unit: &P::Unit) -> Fingerprint;

    /// Returns `true` if a summary recorded with `recorded` still applies to `unit`.
    fn is_valid(&self, unit: &P::Unit, recorded: Fingerprint) -> bool {
        self.fingerprint(unit) == recorded
    }

    /// Wraps `summary` with the current fingerprint of `unit`.
    fn prepare(&self, unit: &P::Unit, summary: Summary<P>, origin: Origin) -> PersistedSummary<P> {
        PersistedSummary::new(summary, self.fingerprint(unit), origin)
    }
}

/// Fingerprints units by hashing the content parts supplied by a callback.
///
/// The callback feeds every behavior-affecting part of the unit (typically
/// its code bytes and its signature) into the builder.
pub struct ContentHashing<F> {
    content: F,
}

impl<F> ContentHashing<F> {
    /// Creates a strategy hashing whatever `content` feeds into the builder.
    pub fn new(content: F) -> Self {
        Self { content }
    }
}

impl<P, F> HashingStrategy<P> for ContentHashing<F>
where
    P: ProgramModel,
    F: Fn(&P::Unit, FingerprintBuilder) -> FingerprintBuilder + Send + Sync,
{
    fn fingerprint(&self, unit: &P::Unit) -> Fingerprint {
        (self.content)(unit, FingerprintBuilder::new()).finish()
    }
}

/// Accepts every persisted summary without looking at the unit.
///
/// Unsafe for general use: a changed unit silently keeps its stale summary.
/// Only appropriate when the container is known to match the program, e.g.
/// because it was verified by the build system that produced both.
pub struct TrustingHashing {
    _private: (),
}

impl TrustingHashing {
    /// Creates the strategy, logging a warning that validity is not checked.
    pub fn new() -> Self {
        tracing::warn!("summary validity checks are disabled; cached summaries may be stale");
        Self { _private: () }
    }
}

impl Default for TrustingHashing {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ProgramModel> HashingStrategy<P> for TrustingHashing {
    fn fingerprint(&self, _unit: &P::Unit) -> Fingerprint {
        Fingerprint::ZERO
    }

    fn is_valid(&self, _unit: &P::Unit, _recorded: Fingerprint) -> bool {
        true
    }
}
