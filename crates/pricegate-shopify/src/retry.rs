//! Retry with exponential backoff for transient storefront errors.
//!
//! Only rate limiting (429) and network-level failures are retried.
//! Structural failures — GraphQL errors, unparsable bodies, malformed
//! nodes — return immediately: retrying cannot fix them.

use std::future::Future;
use std::time::Duration;

use crate::error::StorefrontError;

fn is_retriable(err: &StorefrontError) -> bool {
    matches!(
        err,
        StorefrontError::RateLimited { .. } | StorefrontError::Http(_)
    )
}

/// Executes `operation`, sleeping `backoff_base_secs * 2^attempt` seconds
/// between attempts on retriable errors, up to `max_retries` additional
/// attempts after the first. The last error is returned once retries are
/// exhausted.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, StorefrontError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorefrontError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                err
            }
        };

        // Cap the shift to keep the multiplication from overflowing on
        // absurd retry configs.
        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient storefront error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
