use std::time::Duration;

use anyhow::Context;
use rand::Rng;
use tokio::time::sleep;

use crate::common::utils::retry::retry_with_backoff;
use crate::monitor::MonitorResult;
use crate::monitor::config::{
    DESYNC_GRACE_PERIOD, INSPECTION_RETRY_BACKOFF, STARTUP_JITTER_MAX,
};
use crate::monitor::markers::{MarkerState, Markers};
use crate::scheduler::{JobId, QueueInspector, Submitter};

/// Terminal outcome of a monitored job, as reported by its marker files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failed,
}

impl JobOutcome {
    /// Process exit code promised to the dependency tracker.
    pub fn exit_code(self) -> i32 {
        match self {
            JobOutcome::Success => 0,
            JobOutcome::Failed => 2,
        }
    }
}

/// Cadences and budgets of the monitoring loop, immutable for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Marker-poll cadence.
    pub sleep_time: Duration,
    /// Polling time that has to elapse between queue-based crash checks.
    pub crashcheck_interval: Duration,
    /// Consecutive failed queue queries tolerated before the fatal abort.
    pub crashcheck_attempts: u32,
    /// Resubmissions allowed for jobs stuck in a scheduler error state.
    pub error_resub_limit: u32,
}

/// Babysits a single batch job: submits it, watches its marker files and
/// periodically cross-checks the scheduler queue to catch attempts that died
/// without leaving a marker or got stuck in an error state.
///
/// The loop is strictly sequential; the only suspension points are the
/// configured sleeps, and at most one external command is in flight at any
/// moment.
pub struct Monitor {
    config: MonitorConfig,
    markers: Markers,
    submitter: Box<dyn Submitter>,
    queue: Box<dyn QueueInspector>,
    /// Error-state resubmissions consumed so far.
    error_resubs: u32,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        markers: Markers,
        submitter: Box<dyn Submitter>,
        queue: Box<dyn QueueInspector>,
    ) -> Self {
        Self {
            config,
            markers,
            submitter,
            queue,
            error_resubs: 0,
        }
    }

    /// Drives the job to a terminal outcome. The only fatal conditions are a
    /// failed (re)submission, a failed kill and exhaustion of the
    /// queue-inspection budget; everything else is retried within its budget.
    pub async fn run(mut self) -> MonitorResult<JobOutcome> {
        // This process only starts once a dependency tracker has decided the
        // job must run, so leftover markers are stale by definition.
        self.markers
            .clear()
            .context("cannot remove stale marker files")?;
        let mut job_id = self.submit("initial submission").await?;

        // Spread out the queue traffic of monitors launched in one batch.
        let jitter = rand::rng().random_range(1..=STARTUP_JITTER_MAX.as_secs());
        sleep(Duration::from_secs(jitter)).await;

        let mut elapsed = Duration::ZERO;
        loop {
            if let Some(outcome) = self.check_markers(job_id) {
                return Ok(outcome);
            }
            sleep(self.config.sleep_time).await;
            elapsed += self.config.sleep_time;

            if elapsed >= self.config.crashcheck_interval {
                if let Some(outcome) = self.crash_check(&mut job_id).await? {
                    return Ok(outcome);
                }
                elapsed = Duration::ZERO;
            }
        }
    }

    /// One queue-based crash check. Returns a terminal outcome when the
    /// markers resolved during the check, `None` when monitoring continues
    /// (possibly with a fresh job id).
    async fn crash_check(&mut self, job_id: &mut JobId) -> MonitorResult<Option<JobOutcome>> {
        let snapshot = retry_with_backoff(
            self.config.crashcheck_attempts,
            INSPECTION_RETRY_BACKOFF,
            || self.queue.list_jobs(),
        )
        .await
        .context("queue inspection attempts exhausted")?;

        match snapshot.get(job_id).copied() {
            Some(true) => {
                log::debug!("job {job_id} is queued and healthy");
                Ok(None)
            }
            Some(false) => {
                self.handle_errored(job_id).await?;
                Ok(None)
            }
            None => self.handle_vanished(job_id).await,
        }
    }

    /// The job is queued but in an error state (e.g. `Eqw`): kill it, then
    /// resubmit or give up depending on the remaining budget.
    async fn handle_errored(&mut self, job_id: &mut JobId) -> MonitorResult<()> {
        log::warn!("job {job_id} is in a scheduler error state, killing it");
        self.queue
            .kill(*job_id)
            .await
            .with_context(|| format!("cannot kill errored job {job_id}"))?;

        if self.error_resubs >= self.config.error_resub_limit {
            anyhow::bail!(
                "job {job_id} is in a scheduler error state and the resubmission limit ({}) is reached, terminating",
                self.config.error_resub_limit
            );
        }
        self.error_resubs += 1;
        *job_id = self
            .submit(&format!(
                "error state resubmission {}/{}",
                self.error_resubs, self.config.error_resub_limit
            ))
            .await?;
        Ok(())
    }

    /// The job is gone from the queue. Markers can lag behind the queue on
    /// shared storage, so give them a grace period before declaring a crash.
    async fn handle_vanished(&mut self, job_id: &mut JobId) -> MonitorResult<Option<JobOutcome>> {
        // The job may have finished between the last marker check and the
        // queue query.
        if let Some(outcome) = self.check_markers(*job_id) {
            return Ok(Some(outcome));
        }

        log::warn!(
            "job {job_id} is missing from the queue but its marker files have not been written, \
             possibly filesystem desync; waiting {} for them to appear",
            humantime::format_duration(DESYNC_GRACE_PERIOD)
        );
        sleep(DESYNC_GRACE_PERIOD).await;
        if let Some(outcome) = self.check_markers(*job_id) {
            log::info!("job {job_id} resolved its missing markers within the grace period");
            return Ok(Some(outcome));
        }

        // A genuine crash: the attempt died without reporting. Resubmission
        // here is deliberately uncapped; only a failed submission stops it.
        log::warn!("job {job_id} crashed without leaving a marker, resubmitting");
        *job_id = self.submit("crash resubmission").await?;
        Ok(None)
    }

    async fn submit(&self, reason: &str) -> MonitorResult<JobId> {
        let submission = self
            .submitter
            .submit()
            .await
            .with_context(|| format!("cannot submit job ({reason})"))?;
        log::info!("{reason}: job {} submitted", submission.job_id);
        let echo = submission.output.trim();
        if !echo.is_empty() {
            log::debug!("sbatch output: {echo}");
        }
        Ok(submission.job_id)
    }

    fn check_markers(&self, job_id: JobId) -> Option<JobOutcome> {
        match self.markers.check() {
            MarkerState::Success => {
                log::info!("job {job_id} finished, success marker found");
                Some(JobOutcome::Success)
            }
            MarkerState::Fail => {
                log::info!("job {job_id} finished, fail marker found");
                Some(JobOutcome::Failed)
            }
            MarkerState::Missing => None,
        }
    }
}
