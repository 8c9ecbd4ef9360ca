//! The summary store: compute-or-reuse for every summary request, plus the
//! load and persist passes that carry summaries across analysis runs.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use summa_common::Fingerprint;
use summa_config::SummaryCacheConfig;
use tracing::{debug, info, warn};

use crate::codec::{self, Rejection, SerializedSummary};
use crate::container::{self, ContainerEntry};
use crate::error::CacheError;
use crate::executor::{catch_panic, RayonExecutor, TaskExecutor};
use crate::filter::{Eligibility, EligibilityFilter, SummaryInvalidator};
use crate::hashing::HashingStrategy;
use crate::id::UnitId;
use crate::model::{Origin, PersistedSummary, ProgramModel, Summary};
use crate::report::{LoadReport, PersistReport};
use crate::resolve::ResolutionStrategy;

/// Computes summaries from scratch when the store has none.
pub trait SummaryAnalyzer<P: ProgramModel>: Send + Sync {
    /// Analyzes `unit` and returns its summary.
    ///
    /// Must not request the summary of `unit` itself from the store.
    fn compute_summary(&self, unit: &P::Unit) -> Summary<P>;
}

/// Failure reported by a [`GraphReconstructor`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("graph reconstruction failed: {message}")]
pub struct ReconstructionError {
    /// Description of the failure.
    pub message: String,
}

impl ReconstructionError {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Rebuilds the detailed program representation of a unit whose summary was
/// served from the cache.
///
/// Later phases still need the unit's graph even though its summary was not
/// recomputed. Runs on the store's executor; its outcome never affects the
/// summary returned to the caller.
pub trait GraphReconstructor<P: ProgramModel>: Send + Sync {
    /// Parses and decodes the graph of `unit`.
    fn reconstruct(&self, unit: &P::Unit) -> Result<(), ReconstructionError>;
}

/// Reconstructor for drivers that do not need graphs after a cache hit.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReconstruction;

impl<P: ProgramModel> GraphReconstructor<P> for NoReconstruction {
    fn reconstruct(&self, _unit: &P::Unit) -> Result<(), ReconstructionError> {
        Ok(())
    }
}

/// Concurrent cache of per-unit summaries.
///
/// Every entry was either computed during this run or loaded from a previous
/// run and validated against the unit's current fingerprint at load time, so
/// presence in the map means the entry is valid for this snapshot.
pub struct SummaryStore<P: ProgramModel> {
    entries: DashMap<P::Unit, Arc<PersistedSummary<P>>>,
    in_flight: DashMap<P::Unit, Arc<Mutex<()>>>,
    reconstructed: DashSet<P::Unit>,
    hashing: Arc<dyn HashingStrategy<P>>,
    resolution: Arc<dyn ResolutionStrategy<P>>,
    analyzer: Arc<dyn SummaryAnalyzer<P>>,
    reconstructor: Arc<dyn GraphReconstructor<P>>,
    executor: Arc<dyn TaskExecutor>,
    filter: EligibilityFilter,
    storage: Option<PathBuf>,
}

impl<P: ProgramModel> SummaryStore<P> {
    /// Creates an empty store.
    ///
    /// Reconstruction defaults to [`NoReconstruction`] on a rayon pool sized
    /// by `config.reconstruction_threads`.
    pub fn new(
        config: &SummaryCacheConfig,
        hashing: Arc<dyn HashingStrategy<P>>,
        resolution: Arc<dyn ResolutionStrategy<P>>,
        analyzer: Arc<dyn SummaryAnalyzer<P>>,
    ) -> Result<Self, CacheError> {
        let filter = EligibilityFilter::new(&config.filter)?;
        let executor = RayonExecutor::new(config.reconstruction_threads)?;
        let storage = config.storage_path().map(Path::to_path_buf);
        info!(
            filter = filter.pattern(),
            storage = ?storage,
            "summary store created"
        );
        Ok(Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            reconstructed: DashSet::new(),
            hashing,
            resolution,
            analyzer,
            reconstructor: Arc::new(NoReconstruction),
            executor: Arc::new(executor),
            filter,
            storage,
        })
    }

    /// Replaces the reconstructor run after cache hits.
    pub fn with_reconstructor(mut self, reconstructor: Arc<dyn GraphReconstructor<P>>) -> Self {
        self.reconstructor = reconstructor;
        self
    }

    /// Replaces the executor reconstruction tasks are submitted to.
    pub fn with_executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Returns the summary of `unit`, computing it if the store has none.
    ///
    /// A hit on a loaded entry schedules graph reconstruction for the unit
    /// (once per unit) without waiting for it. A miss runs the analyzer under
    /// a per-unit lock, so concurrent first requests for the same unit compute
    /// it once. The caller always receives its own copy.
    pub fn get_summary(&self, unit: &P::Unit) -> Summary<P> {
        if let Some(summary) = self.cached(unit) {
            return summary;
        }

        let lock = Arc::clone(&self.in_flight.entry(unit.clone()).or_default());
        let guard = lock.lock();
        if let Some(summary) = self.cached(unit) {
            drop(guard);
            self.in_flight.remove(unit);
            return summary;
        }

        let summary = self.analyzer.compute_summary(unit);
        let prepared = self
            .hashing
            .prepare(unit, summary.clone(), Origin::Computed);
        self.entries.insert(unit.clone(), Arc::new(prepared));
        drop(guard);
        self.in_flight.remove(unit);
        summary
    }

    fn cached(&self, unit: &P::Unit) -> Option<Summary<P>> {
        // Clone the Arc so the shard lock is released before copying the summary.
        let entry = self.entries.get(unit).map(|e| Arc::clone(e.value()))?;
        if entry.origin() == Origin::Loaded && self.reconstructed.insert(unit.clone()) {
            self.schedule_reconstruction(unit);
        }
        Some(entry.summary().clone())
    }

    fn schedule_reconstruction(&self, unit: &P::Unit) {
        let reconstructor = Arc::clone(&self.reconstructor);
        let unit = unit.clone();
        self.executor.spawn(Box::new(move || {
            let outcome = catch_panic(|| {
                if let Err(e) = reconstructor.reconstruct(&unit) {
                    warn!(unit = ?unit, error = %e, "graph reconstruction failed");
                }
            });
            if let Err(panic) = outcome {
                warn!(unit = ?unit, panic = %panic, "graph reconstruction panicked");
            }
        }));
    }

    /// Loads the configured container into the store.
    ///
    /// A disabled store or a missing file loads nothing. A container that
    /// cannot be read or decoded is an error for this call; the store is left
    /// untouched and analysis proceeds without cached summaries.
    pub fn load_data(&self) -> Result<LoadReport, CacheError> {
        let Some(path) = self.storage.as_deref() else {
            return Ok(LoadReport::default());
        };
        self.load_from(path)
    }

    /// Loads the container at `path` into the store.
    pub fn load_from(&self, path: &Path) -> Result<LoadReport, CacheError> {
        let entries = match container::read_container(path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load summaries");
                return Err(e);
            }
        };
        let Some(entries) = entries else {
            debug!(path = %path.display(), "no summary container found");
            return Ok(LoadReport::default());
        };
        let report = self.load_entries(entries);
        info!(
            path = %path.display(),
            loaded = report.loaded,
            attempted = report.attempted,
            "{report}"
        );
        Ok(report)
    }

    /// Validates and inserts already-decoded entries.
    ///
    /// An entry is inserted only if its unit resolves, its fingerprint matches
    /// the unit's current fingerprint, and every cross-reference resolves.
    pub fn load_entries(&self, entries: impl IntoIterator<Item = ContainerEntry>) -> LoadReport {
        let mut report = LoadReport::default();
        for (id, serialized) in entries {
            report.attempted += 1;
            let Some(unit) = self.resolution.resolve_unit(&id) else {
                debug!(unit = %id, "cached unit no longer exists");
                report.unresolved_unit += 1;
                continue;
            };
            if !self.hashing.is_valid(&unit, serialized.fingerprint) {
                debug!(unit = %id, "cached summary is stale");
                report.stale += 1;
                continue;
            }
            match codec::decode(&serialized, self.resolution.as_ref()) {
                Ok(summary) => {
                    let persisted =
                        PersistedSummary::new(summary, serialized.fingerprint, Origin::Loaded);
                    self.entries.insert(unit, Arc::new(persisted));
                    report.loaded += 1;
                }
                Err(e) => {
                    debug!(unit = %id, error = %e, "cached summary has dangling references");
                    report.unresolved_reference += 1;
                }
            }
        }
        report
    }

    /// Writes every eligible entry to the configured container.
    ///
    /// Units in `skip` are never written. A disabled store writes nothing.
    pub fn persist_data(&self, skip: &HashSet<P::Unit>) -> Result<PersistReport, CacheError> {
        let Some(path) = self.storage.as_deref() else {
            return Ok(PersistReport::default());
        };
        self.persist_to(path, skip)
    }

    /// Persists using the skip set reported by `invalidator`.
    pub fn persist_with(
        &self,
        invalidator: &dyn SummaryInvalidator<P>,
    ) -> Result<PersistReport, CacheError> {
        self.persist_data(&invalidator.summaries_to_skip())
    }

    /// Writes every eligible entry to the container at `path`.
    pub fn persist_to(
        &self,
        path: &Path,
        skip: &HashSet<P::Unit>,
    ) -> Result<PersistReport, CacheError> {
        debug!(skipped = skip.len(), "skipping invalidated summaries");
        let (entries, report) = self.serialize_entries(skip);
        if let Err(e) = container::write_container(path, &entries) {
            warn!(path = %path.display(), error = %e, "failed to persist summaries");
            return Err(e);
        }
        info!(
            path = %path.display(),
            written = report.written,
            entries = report.entries,
            "{report}"
        );
        Ok(report)
    }

    /// Serializes every eligible entry, sorted by unit identifier.
    pub fn serialize_entries(&self, skip: &HashSet<P::Unit>) -> (Vec<ContainerEntry>, PersistReport) {
        let snapshot: Vec<(P::Unit, Arc<PersistedSummary<P>>)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();

        let mut report = PersistReport {
            entries: snapshot.len(),
            ..PersistReport::default()
        };
        let mut serialized: BTreeMap<UnitId, SerializedSummary> = BTreeMap::new();
        for (unit, persisted) in snapshot {
            let Some(id) = self.resolution.unit_id(&unit) else {
                debug!(unit = ?unit, "unit has no stable identifier");
                report.rejected += 1;
                continue;
            };
            match self.filter.check(&unit, &id.qualified_name(), skip) {
                Eligibility::Eligible => {}
                Eligibility::Skipped => {
                    report.skipped += 1;
                    continue;
                }
                Eligibility::FilteredOut => {
                    report.filtered_out += 1;
                    continue;
                }
            }
            match self.encode_entry(&id, &persisted) {
                Ok(s) => {
                    serialized.insert(id, s);
                }
                Err(rejection) => {
                    debug!(unit = %id, reason = %rejection, "summary not persisted");
                    report.rejected += 1;
                }
            }
        }
        report.written = serialized.len();
        (serialized.into_iter().collect(), report)
    }

    fn encode_entry(
        &self,
        id: &UnitId,
        persisted: &PersistedSummary<P>,
    ) -> Result<SerializedSummary, Rejection> {
        if id.is_unstable() {
            return Err(Rejection::Unstable {
                identifier: id.to_string(),
                owner: id.owner.clone(),
            });
        }
        codec::encode(
            persisted.summary(),
            persisted.fingerprint(),
            self.resolution.as_ref(),
        )
    }

    /// Number of units with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `unit` has an entry.
    pub fn contains(&self, unit: &P::Unit) -> bool {
        self.entries.contains_key(unit)
    }

    /// Fingerprint recorded for `unit`, if it has an entry.
    pub fn fingerprint_of(&self, unit: &P::Unit) -> Option<Fingerprint> {
        self.entries.get(unit).map(|e| e.fingerprint())
    }

    /// Origin of the entry for `unit`, if any.
    pub fn origin_of(&self, unit: &P::Unit) -> Option<Origin> {
        self.entries.get(unit).map(|e| e.origin())
    }

    /// The configured container path, or `None` when persistence is disabled.
    pub fn storage_path(&self) -> Option<&Path> {
        self.storage.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use crate::fixtures::{FakeAnalyzer, RecordingReconstructor, Snapshot, TestProgram};
    use crate::id::{FieldId, TypeId};

    struct Harness {
        store: SummaryStore<TestProgram>,
        analyzer: Arc<FakeAnalyzer>,
        _dir: tempfile::TempDir,
        path: PathBuf,
    }

    fn harness(snapshot: Snapshot, analyzer: FakeAnalyzer, filter: &str) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summaries.bin");
        let config = SummaryCacheConfig::new(&path, filter);
        let analyzer = Arc::new(analyzer);
        let hashing = snapshot.hashing();
        let store = SummaryStore::<TestProgram>::new(
            &config,
            Arc::new(hashing),
            Arc::new(snapshot.names),
            analyzer.clone(),
        )
        .unwrap()
        .with_executor(Arc::new(InlineExecutor));
        Harness {
            store,
            analyzer,
            _dir: dir,
            path,
        }
    }

    #[test]
    fn miss_computes_and_caches() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"invokestatic helper");
        let helper = snapshot.unit("Util", "helper", b"ireturn");
        let expected = Summary {
            invoked_units: vec![helper],
            ..Summary::empty()
        };
        let h = harness(
            snapshot,
            FakeAnalyzer::new().with(run, expected.clone()),
            r"Main\.run",
        );

        assert_eq!(h.store.get_summary(&run), expected);
        assert_eq!(h.store.get_summary(&run), expected);
        assert_eq!(h.analyzer.calls(), 1);
        assert_eq!(h.store.origin_of(&run), Some(Origin::Computed));
    }

    #[test]
    fn returned_summary_is_a_copy() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"return");
        let ty = snapshot.ty("Main");
        let summary = Summary {
            accessed_types: vec![ty],
            ..Summary::empty()
        };
        let h = harness(snapshot, FakeAnalyzer::new().with(run, summary), ".*");

        let mut first = h.store.get_summary(&run);
        first.accessed_types.clear();
        assert_eq!(h.store.get_summary(&run).accessed_types, vec![ty]);
    }

    #[test]
    fn persist_writes_single_matching_entry() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"return");
        let h = harness(snapshot, FakeAnalyzer::new(), r"Main\.run");

        h.store.get_summary(&run);
        assert_eq!(h.analyzer.calls(), 1);

        let report = h.store.persist_data(&HashSet::new()).unwrap();
        assert_eq!(report.written, 1);
        let entries = container::read_container(&h.path).unwrap().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, UnitId::new("Main", "run"));
    }

    #[test]
    fn non_matching_units_are_not_persisted() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"return");
        let helper = snapshot.unit("Util", "helper", b"ireturn");
        let h = harness(snapshot, FakeAnalyzer::new(), r"Main\.run");

        h.store.get_summary(&run);
        h.store.get_summary(&helper);
        let report = h.store.persist_data(&HashSet::new()).unwrap();
        assert_eq!(report.entries, 2);
        assert_eq!(report.written, 1);
        assert_eq!(report.filtered_out, 1);
    }

    #[test]
    fn stale_entry_is_not_loaded() {
        let mut snapshot = Snapshot::new();
        let helper = snapshot.unit("Util", "helper", b"iconst_2 ireturn");
        let h = harness(snapshot, FakeAnalyzer::new(), ".*");

        let h1 = Fingerprint::from_bytes(b"iconst_1 ireturn");
        let entry = (
            UnitId::new("Util", "helper"),
            SerializedSummary {
                fingerprint: h1,
                invoked_units: vec![],
                implementation_invoked_units: vec![],
                accessed_types: vec![],
                instantiated_types: vec![],
                read_fields: vec![],
                written_fields: vec![],
            },
        );
        container::write_container(&h.path, &[entry]).unwrap();

        let report = h.store.load_data().unwrap();
        assert_eq!(report.attempted, 1);
        assert_eq!(report.loaded, 0);
        assert_eq!(report.stale, 1);
        assert!(!h.store.contains(&helper));
    }

    #[test]
    fn closure_reference_omits_unit() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"invokedynamic");
        let lambda = snapshot.ty("Main$$Lambda$14/0x0000000800066840");
        let summary = Summary {
            accessed_types: vec![lambda],
            ..Summary::empty()
        };
        let h = harness(snapshot, FakeAnalyzer::new().with(run, summary), ".*");

        h.store.get_summary(&run);
        let report = h.store.persist_data(&HashSet::new()).unwrap();
        assert_eq!(report.rejected, 1);
        let entries = container::read_container(&h.path).unwrap().unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn lambda_unit_itself_is_not_persisted() {
        let mut snapshot = Snapshot::new();
        let body = snapshot.unit("Main$$Lambda$3/0x0000000800c0b000", "run", b"");
        let h = harness(snapshot, FakeAnalyzer::new(), ".*");

        h.store.get_summary(&body);
        let report = h.store.persist_data(&HashSet::new()).unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(report.written, 0);
    }

    #[test]
    fn skipped_units_are_not_persisted() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"return");
        let main = snapshot.unit("Main", "main", b"invokestatic run");
        let h = harness(snapshot, FakeAnalyzer::new(), ".*");

        h.store.get_summary(&run);
        h.store.get_summary(&main);
        let skip: HashSet<u32> = [run].into_iter().collect();
        let report = h.store.persist_data(&skip).unwrap();
        assert_eq!(report.skipped, 1);

        let entries = container::read_container(&h.path).unwrap().unwrap();
        let ids: Vec<UnitId> = entries.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![UnitId::new("Main", "main")]);
    }

    #[test]
    fn persist_with_invalidator() {
        struct SkipAll(HashSet<u32>);
        impl SummaryInvalidator<TestProgram> for SkipAll {
            fn summaries_to_skip(&self) -> HashSet<u32> {
                self.0.clone()
            }
        }

        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"return");
        let h = harness(snapshot, FakeAnalyzer::new(), ".*");
        h.store.get_summary(&run);

        let report = h
            .store
            .persist_with(&SkipAll([run].into_iter().collect()))
            .unwrap();
        assert_eq!(report.written, 0);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn persist_is_idempotent() {
        let mut snapshot = Snapshot::new();
        let units: Vec<u32> = ["a", "b", "c", "d"]
            .iter()
            .map(|sig| snapshot.unit("Main", sig, sig.as_bytes()))
            .collect();
        let count = snapshot.field("Main", "count");
        let mut analyzer = FakeAnalyzer::new();
        for (i, unit) in units.iter().enumerate() {
            analyzer = analyzer.with(
                *unit,
                Summary {
                    invoked_units: units[..i].to_vec(),
                    read_fields: vec![count],
                    ..Summary::empty()
                },
            );
        }
        let h = harness(snapshot, analyzer, ".*");
        for unit in &units {
            h.store.get_summary(unit);
        }

        h.store.persist_data(&HashSet::new()).unwrap();
        let first = std::fs::read(&h.path).unwrap();
        h.store.persist_data(&HashSet::new()).unwrap();
        let second = std::fs::read(&h.path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn load_counts_each_failure_kind() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"return");
        let helper = snapshot.unit("Util", "helper", b"ireturn");
        let hashing = snapshot.hashing();
        let run_fp = HashingStrategy::<TestProgram>::fingerprint(&hashing, &run);
        let helper_fp = HashingStrategy::<TestProgram>::fingerprint(&hashing, &helper);
        let h = harness(snapshot, FakeAnalyzer::new(), ".*");

        let summary = |fingerprint, accessed_types| SerializedSummary {
            fingerprint,
            invoked_units: vec![],
            implementation_invoked_units: vec![],
            accessed_types,
            instantiated_types: vec![],
            read_fields: vec![],
            written_fields: vec![],
        };
        let report = h.store.load_entries(vec![
            (UnitId::new("Main", "run"), summary(run_fp, vec![])),
            (UnitId::new("Gone", "away"), summary(run_fp, vec![])),
            (
                UnitId::new("Util", "helper"),
                summary(helper_fp, vec![TypeId::new("RemovedType")]),
            ),
        ]);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.unresolved_unit, 1);
        assert_eq!(report.unresolved_reference, 1);
        assert!(h.store.contains(&run));
        assert!(!h.store.contains(&helper));
    }

    #[test]
    fn loaded_hit_skips_analyzer_and_reconstructs_once() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"return");
        let count = snapshot.field("Main", "count");
        let fp = HashingStrategy::<TestProgram>::fingerprint(&snapshot.hashing(), &run);
        let h = harness(snapshot, FakeAnalyzer::new(), ".*");
        let reconstructor = Arc::new(RecordingReconstructor::new());
        let store = h.store.with_reconstructor(reconstructor.clone());

        store.load_entries(vec![(
            UnitId::new("Main", "run"),
            SerializedSummary {
                fingerprint: fp,
                invoked_units: vec![],
                implementation_invoked_units: vec![],
                accessed_types: vec![],
                instantiated_types: vec![],
                read_fields: vec![],
                written_fields: vec![FieldId::new("Main", "count")],
            },
        )]);

        let summary = store.get_summary(&run);
        assert_eq!(summary.written_fields, vec![count]);
        store.get_summary(&run);
        assert_eq!(h.analyzer.calls(), 0);
        assert_eq!(reconstructor.seen(), vec![run]);
        assert_eq!(store.origin_of(&run), Some(Origin::Loaded));
    }

    #[test]
    fn reconstruction_failures_are_isolated() {
        for reconstructor in [
            RecordingReconstructor::failing(),
            RecordingReconstructor::panicking(),
        ] {
            let mut snapshot = Snapshot::new();
            let run = snapshot.unit("Main", "run", b"return");
            let fp = HashingStrategy::<TestProgram>::fingerprint(&snapshot.hashing(), &run);
            let h = harness(snapshot, FakeAnalyzer::new(), ".*");
            let reconstructor = Arc::new(reconstructor);
            let store = h.store.with_reconstructor(reconstructor.clone());
            store.load_entries(vec![(
                UnitId::new("Main", "run"),
                SerializedSummary {
                    fingerprint: fp,
                    invoked_units: vec![],
                    implementation_invoked_units: vec![],
                    accessed_types: vec![],
                    instantiated_types: vec![],
                    read_fields: vec![],
                    written_fields: vec![],
                },
            )]);

            assert_eq!(store.get_summary(&run), Summary::empty());
            assert_eq!(reconstructor.seen(), vec![run]);
        }
    }

    #[test]
    fn disabled_store_does_not_touch_disk() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"return");
        let hashing = snapshot.hashing();
        let store = SummaryStore::<TestProgram>::new(
            &SummaryCacheConfig::default(),
            Arc::new(hashing),
            Arc::new(snapshot.names),
            Arc::new(FakeAnalyzer::new()),
        )
        .unwrap();

        store.get_summary(&run);
        assert!(store.storage_path().is_none());
        assert_eq!(store.load_data().unwrap(), LoadReport::default());
        assert_eq!(
            store.persist_data(&HashSet::new()).unwrap(),
            PersistReport::default()
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_container_is_empty_cache() {
        let snapshot = Snapshot::new();
        let h = harness(snapshot, FakeAnalyzer::new(), ".*");
        assert_eq!(h.store.load_data().unwrap(), LoadReport::default());
        assert!(h.store.is_empty());
    }

    #[test]
    fn corrupt_container_is_an_error_and_leaves_store_empty() {
        let snapshot = Snapshot::new();
        let h = harness(snapshot, FakeAnalyzer::new(), ".*");
        std::fs::write(&h.path, b"not a container at all").unwrap();
        assert!(h.store.load_data().is_err());
        assert!(h.store.is_empty());
    }

    #[test]
    fn unwritable_container_keeps_store_usable() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"return");
        let h = harness(snapshot, FakeAnalyzer::new(), ".*");
        h.store.get_summary(&run);
        std::fs::create_dir(&h.path).unwrap();

        let err = h.store.persist_data(&HashSet::new()).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
        assert!(!h.path.with_file_name("summaries.bin.tmp").exists());
        assert_eq!(h.store.len(), 1);
        assert_eq!(h.store.get_summary(&run), Summary::empty());
        assert_eq!(h.analyzer.calls(), 1);
    }

    #[test]
    fn concurrent_first_requests_compute_once() {
        let mut snapshot = Snapshot::new();
        let run = snapshot.unit("Main", "run", b"return");
        let h = harness(snapshot, FakeAnalyzer::new().slow(), ".*");

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| h.store.get_summary(&run));
            }
        });
        assert_eq!(h.analyzer.calls(), 1);
        assert_eq!(h.store.len(), 1);
    }

    #[test]
    fn distinct_units_compute_in_parallel() {
        let mut snapshot = Snapshot::new();
        let units: Vec<u32> = (0..16)
            .map(|i| snapshot.unit("Main", &format!("m{i}"), format!("body{i}").as_bytes()))
            .collect();
        let h = harness(snapshot, FakeAnalyzer::new(), ".*");

        std::thread::scope(|scope| {
            for unit in &units {
                let store = &h.store;
                scope.spawn(move || store.get_summary(unit));
            }
        });
        assert_eq!(h.analyzer.calls(), 16);
        assert_eq!(h.store.len(), 16);
    }

    #[test]
    fn invalid_filter_fails_construction() {
        let snapshot = Snapshot::new();
        let hashing = snapshot.hashing();
        let result = SummaryStore::<TestProgram>::new(
            &SummaryCacheConfig::new("x.bin", "Main("),
            Arc::new(hashing),
            Arc::new(snapshot.names),
            Arc::new(FakeAnalyzer::new()),
        );
        assert!(matches!(result, Err(CacheError::InvalidFilter { .. })));
    }
}
