//! Babysitter process for a single Slurm batch job.
//!
//! `sitter` submits one job, then blocks until the job terminates: it polls
//! the `success`/`fail` marker files written by the job script, periodically
//! cross-checks the scheduler queue to catch attempts that died without a
//! marker or got stuck in an error state, and resubmits within bounded
//! budgets. Dependency trackers run one `sitter` per job and read the exit
//! code as the job's result.

pub mod common;
pub mod monitor;
pub mod scheduler;
