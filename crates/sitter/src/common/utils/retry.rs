use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Calls `f` until it succeeds, sleeping `backoff` after every failed call.
/// Returns the last error once `attempts` consecutive calls have failed.
///
/// Failures are absorbed with a logged warning; the budget and the backoff
/// are fixed for the whole call.
pub async fn retry_with_backoff<T, E, F, Fut>(
    attempts: u32,
    backoff: Duration,
    mut f: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    assert!(attempts > 0);

    let mut failed = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                log::warn!(
                    "attempt {}/{attempts} failed: {error}, retrying in {}",
                    failed + 1,
                    humantime::format_duration(backoff)
                );
                tokio::time::sleep(backoff).await;
                failed += 1;
                if failed >= attempts {
                    return Err(error);
                }
            }
        }
    }
}
