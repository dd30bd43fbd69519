//! The job lifecycle state machine: submit, poll the marker files written by
//! the job script, periodically cross-check the scheduler queue, and drive
//! resubmission until the job terminally succeeds or fails.

pub mod config;
pub mod markers;
pub mod process;

pub type MonitorResult<T> = anyhow::Result<T>;
