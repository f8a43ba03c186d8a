//! Back-off retry for a single delivery strategy.
//!
//! Strategy fallback is the primary resilience mechanism; this only smooths
//! over transient conditions on one path (429, connection resets, timeouts,
//! 5xx). Everything else is returned immediately so the fetcher can move on
//! to the next strategy.

use std::future::Future;
use std::time::Duration;

use crate::error::FeedError;

const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` for errors that are worth retrying on the same strategy.
///
/// Retriable: [`FeedError::RateLimited`], network-level [`FeedError::Http`]
/// failures, and 5xx [`FeedError::UnexpectedStatus`].
///
/// Not retriable: 4xx statuses, [`FeedError::Deserialize`] (the body will not
/// change), [`FeedError::InvalidUrl`] and [`FeedError::FetchFailure`].
pub(crate) fn is_retriable(err: &FeedError) -> bool {
    match err {
        FeedError::RateLimited { .. } => true,
        FeedError::Http(e) => e.is_timeout() || e.is_connect(),
        FeedError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        FeedError::Deserialize { .. }
        | FeedError::InvalidUrl { .. }
        | FeedError::FetchFailure { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The wait before retry `n` is `backoff_base_ms * 2^(n-1)` ± 25 % jitter,
/// capped at 30 s. With `max_retries = 0` the operation runs exactly once.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, FeedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FeedError>>,
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
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient feed error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
