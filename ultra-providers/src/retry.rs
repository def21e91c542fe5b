use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::error::AttemptError;

/// Per-attempt wall-clock timeout, per the adapter retry policy.
pub(crate) const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(25);
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const RETRY_JITTER_MAX: Duration = Duration::from_millis(250);

/// Outcome of exhausting the retry policy without a successful attempt.
pub(crate) enum RetryFailure {
    /// A terminal error — the final attempt's message, already
    /// credential-redacted by the caller.
    Failed(String),
    /// The overall deadline elapsed before another attempt could start,
    /// or an in-flight attempt did not finish before the deadline.
    TimedOut,
}

/// Run `attempt` up to `1 + max_retries` times, retrying only on
/// transport errors and vendor 5xx/429, with exponential backoff (base
/// 500ms, jitter up to 250ms) between attempts. Each attempt is bounded by
/// `ATTEMPT_TIMEOUT`; the whole sequence is bounded by `deadline`.
pub(crate) async fn execute_with_retry<F, Fut>(
    max_retries: u32,
    deadline: Instant,
    mut attempt: F,
) -> Result<String, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, AttemptError>>,
{
    let mut last_error: Option<AttemptError> = None;

    for attempt_index in 0..=max_retries {
        if Instant::now() >= deadline {
            return Err(RetryFailure::TimedOut);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let attempt_budget = ATTEMPT_TIMEOUT.min(remaining);

        match tokio::time::timeout(attempt_budget, attempt()).await {
            Ok(Ok(text)) => return Ok(text),
            Ok(Err(e)) => {
                if !e.is_retryable() {
                    return Err(RetryFailure::Failed(e.to_string()));
                }
                last_error = Some(e);
            }
            Err(_elapsed) => return Err(RetryFailure::TimedOut),
        }

        if attempt_index < max_retries {
            let backoff = RETRY_BASE_DELAY * 2_u32.pow(attempt_index);
            let jitter = Duration::from_millis(rand::rng().random_range(0..=RETRY_JITTER_MAX.as_millis() as u64));
            let remaining = deadline.saturating_duration_since(Instant::now());
            let sleep_for = (backoff + jitter).min(remaining);
            if sleep_for.is_zero() {
                return Err(RetryFailure::TimedOut);
            }
            tokio::time::sleep(sleep_for).await;
        }
    }

    Err(last_error.map_or(RetryFailure::TimedOut, |e| RetryFailure::Failed(e.to_string())))
}
