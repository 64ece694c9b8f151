//! Retry policy for idempotent upstream GETs.
//!
//! Transient failures (transport errors, upstream 5xx) retry with
//! exponential backoff, capped and jittered to avoid a thundering herd.
//! Non-idempotent requests never pass through here.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use chemistflow_common::error::ResourceError;

/// Backoff schedule for retried GETs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts = retries + 1.
    pub retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    /// Delay before the given retry (1-based) with ±10% jitter.
    fn delay_for(&self, attempt: u32) -> Duration {
        let delay_ms = (self.base_delay_ms as f64
            * self.backoff_multiplier.powi(attempt as i32 - 1))
        .min(self.max_delay_ms as f64) as u64;

        let jitter = (delay_ms as f64 * 0.1) as u64;
        let jitter_amount = if jitter > 0 && rand::random::<bool>() {
            rand::random::<u64>() % jitter
        } else {
            0
        };

        Duration::from_millis(delay_ms + jitter_amount)
    }

    /// Runs an idempotent operation, retrying while the error is
    /// retryable and the budget lasts.
    pub async fn run<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, ResourceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ResourceError>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retries + 1 {
            if attempt > 1 {
                info!(operation, attempt, "retrying upstream request");
            }
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt <= self.retries => {
                    let delay = self.delay_for(attempt);
                    debug!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "upstream request failed, backing off"
                    );
                    last_error = Some(e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ResourceError::Network("retry budget exhausted".to_string())))
    }
}
