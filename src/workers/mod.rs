//! Worker pool (C4): bounded fan-out over independent OS-process jobs.
//!
//! Scheduling model: cooperative dispatch by the parent, preemptive
//! execution by the OS across independent child processes (§5). Dispatch is
//! bounded by a `rayon` thread pool sized to the configured worker count;
//! each pool thread owns exactly one child process at a time and blocks on
//! it with a ~1Hz poll rather than a tight spin, so slow workers are
//! tolerated without busy-waiting (§4.4).

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use rayon::prelude::*;

use crate::error::{PladsError, Result};

/// One unit of work: an external command plus a caller-assigned identifier
/// used only for logging/tracing (`pids.txt` in the original; here it is a
/// debug artifact, not a control signal — see DESIGN.md).
pub struct WorkerJob {
    pub id: String,
    pub command: Command,
}

impl WorkerJob {
    pub fn new(id: impl Into<String>, command: Command) -> Self {
        WorkerJob { id: id.into(), command }
    }
}

/// The terminal state of one worker job.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub id: String,
    pub success: bool,
    pub exit_code: Option<i32>,
}

pub struct WorkerPool {
    max_concurrent: usize,
}

impl WorkerPool {
    pub fn new(max_concurrent: usize) -> Self {
        WorkerPool {
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run every job in `jobs`, bounded to `max_concurrent` in flight at
    /// once, and block until all have terminated. The pool does not retry
    /// failed children: the first non-zero exit becomes a fatal
    /// [`PladsError::ProcessFailed`] once every job has been awaited
    /// (slower siblings are not abandoned mid-flight).
    ///
    /// If `pids_file` is given, every assigned job id is recorded there
    /// before dispatch, mirroring the original's `pids.txt` for operator
    /// debugging.
    pub fn run_all(&self, jobs: Vec<WorkerJob>, pids_file: Option<&Path>) -> Result<Vec<WorkerOutcome>> {
        if let Some(path) = pids_file {
            let listing: String = jobs.iter().map(|j| format!("{}\n", j.id)).collect();
            std::fs::write(path, listing)?;
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_concurrent)
            .build()
            .expect("worker thread pool builds with a positive thread count");

        let results: Vec<Result<WorkerOutcome>> =
            pool.install(|| jobs.into_par_iter().map(Self::run_one).collect());

        let mut outcomes = Vec::with_capacity(results.len());
        let mut first_failure: Option<PladsError> = None;
        for result in results {
            match result {
                Ok(outcome) => {
                    if !outcome.success && first_failure.is_none() {
                        first_failure = Some(PladsError::ProcessFailed {
                            program: outcome.id.clone(),
                            status: outcome.exit_code.unwrap_or(-1),
                        });
                    }
                    outcomes.push(outcome);
                }
                Err(e) => {
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(outcomes),
        }
    }

    fn run_one(mut job: WorkerJob) -> Result<WorkerOutcome> {
        let program = format!("{:?}", job.command);
        let mut child = job
            .command
            .spawn()
            .map_err(|source| PladsError::ProcessSpawnFailed { program, source })?;

        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(WorkerOutcome {
                    id: job.id,
                    success: status.success(),
                    exit_code: status.code(),
                });
            }
            std::thread::sleep(Duration::from_secs(1));
        }
    }
}
