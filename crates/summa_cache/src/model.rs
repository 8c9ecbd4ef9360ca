//! The in-memory summary shape and the program model it refers into.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use summa_common::Fingerprint;

/// Handle types of a loaded program snapshot.
///
/// Handles are only meaningful within the snapshot that produced them; the
/// cache never persists them directly, it goes through a
/// [`ResolutionStrategy`](crate::resolve::ResolutionStrategy) instead.
pub trait ProgramModel: Send + Sync + 'static {
    /// A unit of analysis (a method or procedure) that owns a summary.
    type Unit: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// A declared type.
    type Type: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// A declared field.
    type Field: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// Descriptor of a call into foreign (runtime-provided) code.
    type ForeignCall: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;
    /// A constant embedded in the unit's code.
    type Constant: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;
}

/// Whole-program analysis result for one unit.
///
/// Every list is a set in meaning; order is preserved through serialization
/// but carries no semantics.
pub struct Summary<P: ProgramModel> {
    /// Direct call targets.
    pub invoked_units: Vec<P::Unit>,
    /// Call targets reached through virtual dispatch.
    pub implementation_invoked_units: Vec<P::Unit>,
    /// Types the unit accesses (casts, type checks, static accesses).
    pub accessed_types: Vec<P::Type>,
    /// Types the unit instantiates.
    pub instantiated_types: Vec<P::Type>,
    /// Fields the unit reads.
    pub read_fields: Vec<P::Field>,
    /// Fields the unit writes.
    pub written_fields: Vec<P::Field>,
    /// Foreign calls made by the unit. Never persisted.
    pub foreign_calls: Vec<P::ForeignCall>,
    /// Constants embedded in the unit. Never persisted.
    pub embedded_constants: Vec<P::Constant>,
}

impl<P: ProgramModel> Summary<P> {
    /// Creates a summary with no references at all.
    pub fn empty() -> Self {
        Self {
            invoked_units: Vec::new(),
            implementation_invoked_units: Vec::new(),
            accessed_types: Vec::new(),
            instantiated_types: Vec::new(),
            read_fields: Vec::new(),
            written_fields: Vec::new(),
            foreign_calls: Vec::new(),
            embedded_constants: Vec::new(),
        }
    }

    /// Compares two summaries as unordered sets, list by list.
    pub fn same_sets(&self, other: &Self) -> bool {
        fn set<T: Eq + Hash>(items: &[T]) -> HashSet<&T> {
            items.iter().collect()
        }
        set(&self.invoked_units) == set(&other.invoked_units)
            && set(&self.implementation_invoked_units) == set(&other.implementation_invoked_units)
            && set(&self.accessed_types) == set(&other.accessed_types)
            && set(&self.instantiated_types) == set(&other.instantiated_types)
            && set(&self.read_fields) == set(&other.read_fields)
            && set(&self.written_fields) == set(&other.written_fields)
            && self.foreign_calls.len() == other.foreign_calls.len()
            && self.foreign_calls.iter().all(|c| other.foreign_calls.contains(c))
            && self.embedded_constants.len() == other.embedded_constants.len()
            && self
                .embedded_constants
                .iter()
                .all(|c| other.embedded_constants.contains(c))
    }
}

impl<P: ProgramModel> Default for Summary<P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P: ProgramModel> Clone for Summary<P> {
    fn clone(&self) -> Self {
        Self {
            invoked_units: self.invoked_units.clone(),
            implementation_invoked_units: self.implementation_invoked_units.clone(),
            accessed_types: self.accessed_types.clone(),
            instantiated_types: self.instantiated_types.clone(),
            read_fields: self.read_fields.clone(),
            written_fields: self.written_fields.clone(),
            foreign_calls: self.foreign_calls.clone(),
            embedded_constants: self.embedded_constants.clone(),
        }
    }
}

impl<P: ProgramModel> PartialEq for Summary<P> {
    fn eq(&self, other: &Self) -> bool {
        self.invoked_units == other.invoked_units
            && self.implementation_invoked_units == other.implementation_invoked_units
            && self.accessed_types == other.accessed_types
            && self.instantiated_types == other.instantiated_types
            && self.read_fields == other.read_fields
            && self.written_fields == other.written_fields
            && self.foreign_calls == other.foreign_calls
            && self.embedded_constants == other.embedded_constants
    }
}

impl<P: ProgramModel> fmt::Debug for Summary<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Summary")
            .field("invoked_units", &self.invoked_units)
            .field(
                "implementation_invoked_units",
                &self.implementation_invoked_units,
            )
            .field("accessed_types", &self.accessed_types)
            .field("instantiated_types", &self.instantiated_types)
            .field("read_fields", &self.read_fields)
            .field("written_fields", &self.written_fields)
            .field("foreign_calls", &self.foreign_calls)
            .field("embedded_constants", &self.embedded_constants)
            .finish()
    }
}

/// Where a store entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Read from a container written by a previous run.
    Loaded,
    /// Computed by the analyzer during this run.
    Computed,
}

/// A summary together with the fingerprint of the unit it was computed for.
///
/// Immutable once built; the store replaces entries wholesale.
pub struct PersistedSummary<P: ProgramModel> {
    summary: Summary<P>,
    fingerprint: Fingerprint,
    origin: Origin,
}

impl<P: ProgramModel> PersistedSummary<P> {
    /// Wraps a summary with the fingerprint it is valid for.
    pub fn new(summary: Summary<P>, fingerprint: Fingerprint, origin: Origin) -> Self {
        Self {
            summary,
            fingerprint,
            origin,
        }
    }

    /// The wrapped summary.
    pub fn summary(&self) -> &Summary<P> {
        &self.summary
    }

    /// Fingerprint of the unit at the time the summary was computed or accepted.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Whether the entry was loaded or computed.
    pub fn origin(&self) -> Origin {
        self.origin
    }
}

impl<P: ProgramModel> fmt::Debug for PersistedSummary<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedSummary")
            .field("fingerprint", &self.fingerprint)
            .field("origin", &self.origin)
            .field("summary", &self.summary)
            .finish()
    }
}
