//! Fire-and-forget executors for post-hit reconstruction work.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::CacheError;

/// A unit of work submitted to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted tasks without the submitter waiting for them.
pub trait TaskExecutor: Send + Sync {
    /// Schedules `task`. Must not block on the task's completion.
    fn spawn(&self, task: Task);
}

/// Executes tasks on a rayon thread pool.
pub struct RayonExecutor {
    pool: Option<rayon::ThreadPool>,
}

impl RayonExecutor {
    /// Creates an executor with a dedicated pool of `threads` workers, or one
    /// that uses rayon's global pool when `threads` is zero.
    pub fn new(threads: usize) -> Result<Self, CacheError> {
        if threads == 0 {
            return Ok(Self::global());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("summa-reconstruct-{i}"))
            .panic_handler(|payload| {
                tracing::warn!(
                    panic = %panic_message(payload.as_ref()),
                    "reconstruction worker panicked"
                );
            })
            .build()
            .map_err(|e| CacheError::Executor {
                reason: e.to_string(),
            })?;
        Ok(Self { pool: Some(pool) })
    }

    /// Creates an executor backed by rayon's global pool.
    pub fn global() -> Self {
        Self { pool: None }
    }
}

impl TaskExecutor for RayonExecutor {
    fn spawn(&self, task: Task) {
        match &self.pool {
            Some(pool) => pool.spawn(task),
            None => rayon::spawn(task),
        }
    }
}

/// Runs every task immediately on the submitting thread.
///
/// Intended for tests and single-threaded drivers.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn spawn(&self, task: Task) {
        task();
    }
}

/// Runs `f`, converting a panic into an error message.
pub(crate) fn catch_panic<F>(f: F) -> Result<(), String>
where
    F: FnOnce(),
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
