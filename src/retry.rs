//! Bounded retry with a fixed politeness delay.
//!
//! Scrapes against rate-limited map services retry at most once or
//! twice with a flat pause between tries; backing off exponentially
//! would not change whether a venue exposes the widget we want.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::ScrapeError;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run an async operation, retrying retryable failures.
    ///
    /// Non-retryable errors are returned immediately. An `Ok` carrying
    /// an empty result is a success and is never retried here.
    pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, ScrapeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScrapeError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error: Option<ScrapeError> = None;

        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !e.is_retryable() {
                        warn!("{} failed without retry: {}", operation_name, e);
                        return Err(e);
                    }
                    if attempt < max_attempts {
                        warn!(
                            "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                            operation_name, attempt, max_attempts, e, self.delay
                        );
                        sleep(self.delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.expect("at least one attempt is always made"))
    }
}
