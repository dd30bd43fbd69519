use std::time::Duration;

/// Wait between queue queries when the listing command itself fails;
/// scheduler query endpoints tend to have intermittent access issues.
pub const INSPECTION_RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// How long marker files are given to appear after the job has left the
/// queue. Jobs finish before their markers become visible on shared storage;
/// there is no perfect general-purpose solution to this desync.
pub const DESYNC_GRACE_PERIOD: Duration = Duration::from_secs(120);

/// Upper bound of the randomized startup delay (uniform, starting at one
/// second) that spreads the queue queries of monitors launched in one batch.
pub const STARTUP_JITTER_MAX: Duration = Duration::from_secs(30);
