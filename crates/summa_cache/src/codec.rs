//! Conversion between live summaries and their persisted, identifier-based form.
//!
//! Both directions are all-or-nothing per summary. A summary with a single
//! reference that cannot be named stably is not written, and a persisted
//! summary with a single reference that no longer resolves is not loaded.
//! Dropping only the offending reference would hand downstream analysis a
//! summary that silently under-reports what the unit touches.

use std::fmt;

use serde::{Deserialize, Serialize};
use summa_common::Fingerprint;

use crate::id::{FieldId, TypeId, UnitId};
use crate::model::{ProgramModel, Summary};
use crate::resolve::ResolutionStrategy;

/// The persisted form of a summary: a fingerprint plus six identifier lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedSummary {
    /// Fingerprint of the unit when the summary was computed or accepted.
    pub fingerprint: Fingerprint,
    /// Direct call targets.
    pub invoked_units: Vec<UnitId>,
    /// Call targets reached through virtual dispatch.
    pub implementation_invoked_units: Vec<UnitId>,
    /// Accessed types.
    pub accessed_types: Vec<TypeId>,
    /// Instantiated types.
    pub instantiated_types: Vec<TypeId>,
    /// Read fields.
    pub read_fields: Vec<FieldId>,
    /// Written fields.
    pub written_fields: Vec<FieldId>,
}

impl SerializedSummary {
    /// Total number of cross-references held by the summary.
    pub fn reference_count(&self) -> usize {
        self.invoked_units.len()
            + self.implementation_invoked_units.len()
            + self.accessed_types.len()
            + self.instantiated_types.len()
            + self.read_fields.len()
            + self.written_fields.len()
    }
}

/// Why a summary was not serialized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// A referenced element has no identifier in the current snapshot.
    #[error("reference {reference} has no stable identifier")]
    Unnamed {
        /// Debug rendering of the live handle.
        reference: String,
    },

    /// A referenced element belongs to a type whose name is not stable across reloads.
    #[error("reference {identifier} belongs to unstable type {owner}")]
    Unstable {
        /// The offending identifier.
        identifier: String,
        /// Its owning type.
        owner: TypeId,
    },

    /// The summary records foreign calls, which have no persisted form.
    #[error("summary records {0} foreign call(s)")]
    ForeignCalls(usize),

    /// The summary records embedded constants, which have no persisted form.
    #[error("summary records {0} embedded constant(s)")]
    EmbeddedConstants(usize),
}

/// A persisted reference that does not resolve in the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to resolve {0}")]
pub struct UnresolvedReference(pub String);

/// An identifier whose stability is decided by its owning type.
trait Owned: fmt::Display {
    fn owner(&self) -> &TypeId;
}

impl Owned for TypeId {
    fn owner(&self) -> &TypeId {
        self
    }
}

impl Owned for UnitId {
    fn owner(&self) -> &TypeId {
        &self.owner
    }
}

impl Owned for FieldId {
    fn owner(&self) -> &TypeId {
        &self.owner
    }
}

/// Serializes `summary` recorded with `fingerprint`.
///
/// Fails with the first [`Rejection`] found; nothing partial is ever returned.
pub fn encode<P, R>(
    summary: &Summary<P>,
    fingerprint: Fingerprint,
    resolution: &R,
) -> Result<SerializedSummary, Rejection>
where
    P: ProgramModel,
    R: ResolutionStrategy<P> + ?Sized,
{
    if !summary.foreign_calls.is_empty() {
        return Err(Rejection::ForeignCalls(summary.foreign_calls.len()));
    }
    if !summary.embedded_constants.is_empty() {
        return Err(Rejection::EmbeddedConstants(
            summary.embedded_constants.len(),
        ));
    }

    Ok(SerializedSummary {
        fingerprint,
        invoked_units: encode_list(&summary.invoked_units, |u| resolution.unit_id(u))?,
        implementation_invoked_units: encode_list(&summary.implementation_invoked_units, |u| {
            resolution.unit_id(u)
        })?,
        accessed_types: encode_list(&summary.accessed_types, |t| resolution.type_id(t))?,
        instantiated_types: encode_list(&summary.instantiated_types, |t| resolution.type_id(t))?,
        read_fields: encode_list(&summary.read_fields, |f| resolution.field_id(f))?,
        written_fields: encode_list(&summary.written_fields, |f| resolution.field_id(f))?,
    })
}

fn encode_list<T, I>(items: &[T], id_of: impl Fn(&T) -> Option<I>) -> Result<Vec<I>, Rejection>
where
    T: fmt::Debug,
    I: Owned,
{
    items
        .iter()
        .map(|item| {
            let id = id_of(item).ok_or_else(|| Rejection::Unnamed {
                reference: format!("{item:?}"),
            })?;
            if id.owner().is_unstable() {
                return Err(Rejection::Unstable {
                    identifier: id.to_string(),
                    owner: id.owner().clone(),
                });
            }
            Ok(id)
        })
        .collect()
}

/// Resolves every reference of `serialized` against the current snapshot.
///
/// Fails on the first reference that does not resolve. The fingerprint is not
/// checked here; validity is the caller's decision.
pub fn decode<P, R>(
    serialized: &SerializedSummary,
    resolution: &R,
) -> Result<Summary<P>, UnresolvedReference>
where
    P: ProgramModel,
    R: ResolutionStrategy<P> + ?Sized,
{
    Ok(Summary {
        invoked_units: decode_list(&serialized.invoked_units, |id| resolution.resolve_unit(id))?,
        implementation_invoked_units: decode_list(&serialized.implementation_invoked_units, |id| {
            resolution.resolve_unit(id)
        })?,
        accessed_types: decode_list(&serialized.accessed_types, |id| resolution.resolve_type(id))?,
        instantiated_types: decode_list(&serialized.instantiated_types, |id| {
            resolution.resolve_type(id)
        })?,
        read_fields: decode_list(&serialized.read_fields, |id| resolution.resolve_field(id))?,
        written_fields: decode_list(&serialized.written_fields, |id| {
            resolution.resolve_field(id)
        })?,
        foreign_calls: Vec::new(),
        embedded_constants: Vec::new(),
    })
}

fn decode_list<I, T>(
    ids: &[I],
    resolve: impl Fn(&I) -> Option<T>,
) -> Result<Vec<T>, UnresolvedReference>
where
    I: fmt::Display,
{
    ids.iter()
        .map(|id| resolve(id).ok_or_else(|| UnresolvedReference(id.to_string())))
        .collect()
}
