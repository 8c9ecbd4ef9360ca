//! Test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use summa_common::FingerprintBuilder;

use crate::hashing::ContentHashing;
use crate::id::{FieldId, TypeId, UnitId};
use crate::model::{ProgramModel, Summary};
use crate::resolve::NameTable;
use crate::store::{GraphReconstructor, ReconstructionError, SummaryAnalyzer};

/// Program model whose handles are plain integers.
pub(crate) struct TestProgram;

impl ProgramModel for TestProgram {
    type Unit = u32;
    type Type = u32;
    type Field = u32;
    type ForeignCall = String;
    type Constant = String;
}

// Shared across snapshots so a reloaded program never reuses a handle.
static NEXT_HANDLE: AtomicU32 = AtomicU32::new(1);

fn next_handle() -> u32 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

/// One loaded "program": declared elements plus the bodies of its units.
pub(crate) struct Snapshot {
    pub(crate) names: NameTable<TestProgram>,
    bodies: HashMap<u32, Vec<u8>>,
}

impl Snapshot {
    pub(crate) fn new() -> Self {
        Self {
            names: NameTable::new(),
            bodies: HashMap::new(),
        }
    }

    pub(crate) fn unit(&mut self, owner: &str, signature: &str, body: &[u8]) -> u32 {
        let handle = next_handle();
        self.names
            .register_unit(UnitId::new(owner, signature), handle);
        self.bodies.insert(handle, body.to_vec());
        handle
    }

    pub(crate) fn ty(&mut self, name: &str) -> u32 {
        let handle = next_handle();
        self.names.register_type(TypeId::new(name), handle);
        handle
    }

    pub(crate) fn field(&mut self, owner: &str, name: &str) -> u32 {
        let handle = next_handle();
        self.names.register_field(FieldId::new(owner, name), handle);
        handle
    }

    pub(crate) fn hashing(
        &self,
    ) -> ContentHashing<impl Fn(&u32, FingerprintBuilder) -> FingerprintBuilder + Send + Sync> {
        let bodies = self.bodies.clone();
        ContentHashing::new(move |unit: &u32, builder: FingerprintBuilder| {
            builder.part(bodies.get(unit).map(Vec::as_slice).unwrap_or_default())
        })
    }
}

/// Analyzer returning canned summaries and counting invocations.
pub(crate) struct FakeAnalyzer {
    summaries: HashMap<u32, Summary<TestProgram>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeAnalyzer {
    pub(crate) fn new() -> Self {
        Self {
            summaries: HashMap::new(),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub(crate) fn with(mut self, unit: u32, summary: Summary<TestProgram>) -> Self {
        self.summaries.insert(unit, summary);
        self
    }

    /// Makes every computation take long enough for requests to overlap.
    pub(crate) fn slow(mut self) -> Self {
        self.delay = Some(Duration::from_millis(50));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SummaryAnalyzer<TestProgram> for FakeAnalyzer {
    fn compute_summary(&self, unit: &u32) -> Summary<TestProgram> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.summaries.get(unit).cloned().unwrap_or_default()
    }
}

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Reconstructor recording which units it was asked to rebuild.
pub(crate) struct RecordingReconstructor {
    seen: Mutex<Vec<u32>>,
    behavior: Behavior,
}

impl RecordingReconstructor {
    pub(crate) fn new() -> Self {
        Self::with_behavior(Behavior::Succeed)
    }

    pub(crate) fn failing() -> Self {
        Self::with_behavior(Behavior::Fail)
    }

    pub(crate) fn panicking() -> Self {
        Self::with_behavior(Behavior::Panic)
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            behavior,
        }
    }

    pub(crate) fn seen(&self) -> Vec<u32> {
        self.seen.lock().clone()
    }
}

impl GraphReconstructor<TestProgram> for RecordingReconstructor {
    fn reconstruct(&self, unit: &u32) -> Result<(), ReconstructionError> {
        self.seen.lock().push(*unit);
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(ReconstructionError::new("bytecode parser rejected body")),
            Behavior::Panic => panic!("graph decoder hit an unknown node"),
        }
    }
}
