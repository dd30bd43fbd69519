//! External collaborators of the monitor: the Submitter issues the job
//! submission command, the Queue Inspector lists and cancels queued jobs.
//! Both are invocations of external scheduler commands whose text output is
//! parsed here; the monitor only sees the contracts below, which keeps the
//! state machine testable with scripted implementations.

mod common;
pub mod slurm;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Scheduler-assigned identifier of one submitted job attempt.
pub type JobId = u64;

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Failure taxonomy of the external scheduler commands.
///
/// `Submission` and `Kill` are always fatal to the monitor. `Inspection` and
/// `Parse` are absorbed within the crash-check retry budget: scheduler query
/// endpoints are treated as intermittently flaky.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("submission failed: {0}")]
    Submission(String),
    #[error("queue inspection failed: {0}")]
    Inspection(String),
    #[error("cannot parse queue listing: {0}")]
    Parse(String),
    #[error("kill command failed: {0}")]
    Kill(String),
}

/// Result of one successful submission.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Id of the new job attempt.
    pub job_id: JobId,
    /// Captured stdout of the submission command, kept for logging.
    pub output: String,
}

/// One fresh listing of the scheduler queue, mapping job id to a coarse
/// health flag: `true` = running normally, `false` = queued or running in an
/// error state. Absence from the map means the job is no longer queued.
pub type QueueSnapshot = HashMap<JobId, bool>;

/// Issues the job submission command.
pub trait Submitter {
    /// Submits a fresh attempt of the job and extracts the scheduler-assigned
    /// id from the command output.
    fn submit(&self) -> Pin<Box<dyn Future<Output = SchedulerResult<Submission>>>>;
}

/// Lists and cancels jobs in the scheduler queue.
pub trait QueueInspector {
    /// Rebuilds the queue snapshot from scratch. An empty snapshot is valid
    /// (the queue is empty).
    fn list_jobs(&self) -> Pin<Box<dyn Future<Output = SchedulerResult<QueueSnapshot>>>>;

    /// Cancels a job. Fire-and-forget: the caller never re-polls the killed
    /// id, it either resubmits or terminates.
    fn kill(&self, job_id: JobId) -> Pin<Box<dyn Future<Output = SchedulerResult<()>>>>;
}
