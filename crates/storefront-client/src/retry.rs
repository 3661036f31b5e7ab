//! Retry with exponential backoff for catalog reads

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use storefront_core::{FetchError, Resource};

/// Upper bound on a single backoff sleep
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry policy
///
/// Attempt `n` (zero-based) that fails retryably sleeps
/// `min(base_delay * 2^n, 30s)` before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff before the first retry, in milliseconds
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    /// Create policy
    #[inline]
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay_ms: u64::try_from(base_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Policy that never retries
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Backoff before retry number `retry` (zero-based)
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
        let millis = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(millis).min(MAX_BACKOFF)
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out
    ///
    /// # Errors
    /// Returns the last error produced by `op`.
    pub async fn run<T, F, Fut>(&self, resource: &Resource, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.max_retries => {
                    let delay = self.backoff(retry);
                    tracing::warn!(
                        %resource,
                        attempt = retry + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err.kind,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}
