//! Counters describing the outcome of a load or persist pass.

use std::fmt;

/// Outcome of [`SummaryStore::load_data`](crate::store::SummaryStore::load_data).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries found in the container.
    pub attempted: usize,
    /// Entries inserted into the store.
    pub loaded: usize,
    /// Entries whose unit no longer exists.
    pub unresolved_unit: usize,
    /// Entries whose fingerprint no longer matches the unit.
    pub stale: usize,
    /// Entries with at least one cross-reference that no longer resolves.
    pub unresolved_reference: usize,
}

impl LoadReport {
    /// Entries that were read but not inserted.
    pub fn dropped(&self) -> usize {
        self.attempted - self.loaded
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loaded {} out of {} summaries ({} unresolved, {} stale, {} with dangling references)",
            self.loaded, self.attempted, self.unresolved_unit, self.stale, self.unresolved_reference
        )
    }
}

/// Outcome of [`SummaryStore::persist_data`](crate::store::SummaryStore::persist_data).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    /// Entries in the store when the snapshot was taken.
    pub entries: usize,
    /// Entries written to the container.
    pub written: usize,
    /// Entries whose unit name did not match the filter.
    pub filtered_out: usize,
    /// Entries excluded by the skip set.
    pub skipped: usize,
    /// Eligible entries the codec refused to serialize.
    pub rejected: usize,
}

impl fmt::Display for PersistReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "saved {} summaries out of {} ({} filtered out, {} skipped, {} rejected)",
            self.written, self.entries, self.filtered_out, self.skipped, self.rejected
        )
    }
}
