//! Bounded retry with exponential backoff for catalog calls.
//!
//! Only errors classified by [`CatalogError::is_transient`] are retried.
//! An explicit miss is an `Ok` value and is never retried.

use std::future::Future;
use std::time::Duration;

use sndb_core::CatalogSource;

use crate::error::CatalogError;

/// Configuration for retry behavior on transient catalog errors.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn from_millis(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// A single attempt with no retries.
    #[must_use]
    pub const fn once() -> Self {
        Self::from_millis(1, 0, 0)
    }

    /// Run `op`, retrying transient failures.
    ///
    /// A rate-limited response waits for its `Retry-After`, capped at
    /// `max_delay`.
    pub async fn run<T, F, Fut>(&self, catalog: CatalogSource, mut op: F) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let mut delay = self.base_delay;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let wait = match &e {
                        CatalogError::RateLimited { retry_after_secs } => {
                            Duration::from_secs(*retry_after_secs).min(self.max_delay)
                        }
                        _ => delay,
                    };
                    tracing::warn!(
                        %catalog,
                        attempt,
                        max_attempts = self.max_attempts,
                        ?wait,
                        error = %e,
                        "transient catalog error, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    delay = (delay * 2).min(self.max_delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
