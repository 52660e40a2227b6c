//! Bounded retry and polling loops shared by every API call.
//!
//! Both loops are generic over the closure that performs one attempt, so the
//! backoff behavior can be exercised under a paused tokio clock without a
//! live endpoint.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::time::{sleep, Instant};

use crate::error::{BflError, Result};
use crate::types::JobStatus;

/// Total attempts for a single HTTP call, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

/// Retry-After fallback when the server omits the header on a 429.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Delay before the second poll iteration.
const POLL_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Ceiling for the growing poll delay.
const POLL_MAX_DELAY: Duration = Duration::from_millis(5000);

/// Growth factor applied to the poll delay each iteration.
const POLL_BACKOFF_FACTOR: f64 = 1.5;

/// Run one HTTP operation with up to [`MAX_ATTEMPTS`] attempts.
///
/// Rate limits (429) wait `retry_after * (attempt_index + 1)` seconds;
/// server errors (5xx) wait `2^attempt_index` seconds; every other error
/// propagates immediately. The last error is returned once attempts are
/// exhausted, without a trailing sleep.
pub async fn retry_request<F, Fut>(what: &str, mut attempt_fn: F) -> Result<Value>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let mut attempt: u32 = 0;
    loop {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= MAX_ATTEMPTS {
                    return Err(err);
                }
                match retry_delay(&err, attempt - 1) {
                    Some(delay) => {
                        tracing::warn!(
                            attempt,
                            delay_secs = delay.as_secs(),
                            error = %err,
                            "{} failed, retrying",
                            what
                        );
                        sleep(delay).await;
                    }
                    None => return Err(err),
                }
            }
        }
    }
}

/// Backoff for a failed attempt, or `None` when the error is not retryable.
///
/// `attempt_index` counts from 0 for the first failure.
pub fn retry_delay(err: &BflError, attempt_index: u32) -> Option<Duration> {
    match err {
        BflError::RateLimit { retry_after, .. } => Some(Duration::from_secs(
            retry_after * (attempt_index as u64 + 1),
        )),
        BflError::Api { status, .. } if *status >= 500 => {
            Some(Duration::from_secs(2u64.pow(attempt_index)))
        }
        _ => None,
    }
}

/// The delay to use after the current one, growing by [`POLL_BACKOFF_FACTOR`]
/// up to [`POLL_MAX_DELAY`].
pub fn next_poll_delay(current: Duration) -> Duration {
    current.mul_f64(POLL_BACKOFF_FACTOR).min(POLL_MAX_DELAY)
}

/// Poll a status endpoint until the job reaches a terminal state or the
/// deadline elapses.
///
/// `fetch` performs one (already retried) GET of the polling URL. `Ready`
/// resolves to the payload's `result` object, falling back to the whole
/// response when the server inlines the fields. `Error` fails with
/// [`BflError::Generation`]; any other status sleeps and polls again. The
/// deadline is checked before each fetch, so a response arriving after the
/// deadline has passed is never consumed.
pub async fn poll<F, Fut>(deadline: Duration, mut fetch: F) -> Result<Value>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let start = Instant::now();
    let mut delay = POLL_INITIAL_DELAY;

    loop {
        if start.elapsed() >= deadline {
            return Err(BflError::Timeout(deadline));
        }

        let response = fetch().await?;
        let status = response
            .get("status")
            .and_then(|v| v.as_str())
            .map(JobStatus::parse)
            .unwrap_or(JobStatus::Other);

        match status {
            JobStatus::Ready => {
                return Ok(response.get("result").cloned().unwrap_or(response));
            }
            JobStatus::Error => {
                let message = response
                    .get("error")
                    .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
                    .unwrap_or_else(|| "Generation failed".to_string());
                return Err(BflError::Generation(message));
            }
            JobStatus::Pending | JobStatus::Other => {
                tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "job not ready");
            }
        }

        sleep(delay).await;
        delay = next_poll_delay(delay);
    }
}
