//! Retry with exponential back-off and jitter for every provider client.
//!
//! [`retry_with_backoff`] wraps a fallible async operation and retries on
//! transient errors. Anything that would fail the same way again is
//! returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;

const MAX_DELAY_SECS: u64 = 60;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** network timeouts and connection failures, HTTP 429, and
/// HTTP 5xx.
///
/// **Not retriable:** 404, other 4xx, malformed bodies, API-level error
/// payloads, missing fields, pagination and URL guards.
pub(crate) fn is_retriable(err: &SourceError) -> bool {
    match err {
        SourceError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SourceError::RateLimited { .. } => true,
        SourceError::UnexpectedStatus { status, .. } => *status >= 500,
        SourceError::Deserialize { .. }
        | SourceError::NotFound { .. }
        | SourceError::Api { .. }
        | SourceError::MissingField { .. }
        | SourceError::PaginationLimit { .. }
        | SourceError::InvalidUrl { .. } => false,
    }
}

/// Seconds to wait before retry number `attempt` (1-based): `base * 2^(attempt-1)`
/// scaled by ±25 % jitter, never below a server `Retry-After` hint, capped at
/// 60 s.
fn backoff_delay(backoff_base_secs: u64, attempt: u32, hint_secs: Option<u64>) -> Duration {
    let computed = backoff_base_secs.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(10));
    let floor = hint_secs.unwrap_or(0);
    let capped = computed.max(floor).min(MAX_DELAY_SECS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let millis = (capped as f64 * 1000.0 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(millis)
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// With `max_retries = 3` the operation is attempted at most 4 times total.
/// A `backoff_base_secs` of 0 retries without sleeping, unless the server
/// sent a `Retry-After` hint.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff_delay(backoff_base_secs, attempt, err.retry_after_secs());
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient provider error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
