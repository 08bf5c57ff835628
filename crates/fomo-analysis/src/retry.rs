//! Retry with exponential back-off and jitter for the remote model and index
//! calls.
//!
//! Only transient failures are retried: network timeouts and connection
//! errors, HTTP 429 and 5xx, and generation results that were empty or never
//! parsed into a digest. Everything else is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::AnalysisError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &AnalysisError) -> bool {
    match err {
        AnalysisError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e
                    .status()
                    .is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
        }
        AnalysisError::Status { status, .. } => *status == 429 || *status >= 500,
        AnalysisError::EmptyResponse | AnalysisError::InvalidDigest(_) => true,
        AnalysisError::Deserialize { .. }
        | AnalysisError::Embedding(_)
        | AnalysisError::NewsLookup(_)
        | AnalysisError::Config(_) => false,
    }
}

/// Back-off before retry number `attempt` (1-based), before jitter.
fn base_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    backoff_base_ms
        .saturating_mul(1u64 << attempt.saturating_sub(1).min(10))
        .min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors. Delay doubles per attempt from `backoff_base_ms`, is capped at
/// 60 s, and carries ±25 % jitter.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    what: &'static str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
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
                let capped = base_delay_ms(backoff_base_ms, attempt);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    what,
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient error; retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
