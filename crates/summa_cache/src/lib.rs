//! Cross-run persistence of per-unit analysis summaries.
//!
//! A whole-program analyzer computes a [`Summary`] for every unit it reaches.
//! This crate caches those summaries in a concurrent [`SummaryStore`], writes
//! the eligible ones to disk at the end of a run, and reloads them at the start
//! of the next run. Persisted summaries refer to units, types and fields by
//! stable names; a [`ResolutionStrategy`] maps them back to the handles of the
//! newly loaded program and a [`HashingStrategy`] rejects summaries whose unit
//! changed in between.

#![warn(missing_docs)]

pub mod codec;
pub mod container;
pub mod error;
pub mod executor;
pub mod filter;
pub mod hashing;
pub mod id;
pub mod model;
pub mod report;
pub mod resolve;
pub mod store;

#[cfg(test)]
mod fixtures;

pub use codec::{decode, encode, Rejection, SerializedSummary, UnresolvedReference};
pub use error::CacheError;
pub use executor::{InlineExecutor, RayonExecutor, TaskExecutor};
pub use filter::{Eligibility, EligibilityFilter, SummaryInvalidator};
pub use hashing::{ContentHashing, HashingStrategy, TrustingHashing};
pub use id::{FieldId, TypeId, UnitId};
pub use model::{Origin, PersistedSummary, ProgramModel, Summary};
pub use report::{LoadReport, PersistReport};
pub use resolve::{NameTable, ResolutionStrategy};
pub use store::{
    GraphReconstructor, NoReconstruction, ReconstructionError, SummaryAnalyzer, SummaryStore,
};
pub use summa_common::{Fingerprint, FingerprintBuilder};
pub use summa_config::SummaryCacheConfig;
