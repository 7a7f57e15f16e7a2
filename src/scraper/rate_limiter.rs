//! Token-bucket politeness limiter for page navigations.
//!
//! Every navigation acquires a token first; acquisition always costs
//! at least the minimum delay so that even a full bucket cannot
//! produce bursty access patterns the target service would penalize.

use std::sync::{Mutex, PoisonError};
use tokio::time::{sleep, Duration, Instant};

struct BucketState {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

/// Navigation rate limiter.
pub struct RateLimiter {
    state: Mutex<BucketState>,
    min_delay: Duration,
    max_delay: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_minute` navigations,
    /// with each acquisition delayed between `min_delay_secs` and
    /// `max_delay_secs` (jittered).
    pub fn new(requests_per_minute: u32, min_delay_secs: f64, max_delay_secs: f64) -> Self {
        let capacity = f64::from(requests_per_minute.max(1));
        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                capacity,
                refill_per_sec: capacity / 60.0,
                last_refill: Instant::now(),
            }),
            min_delay: Duration::from_secs_f64(min_delay_secs.max(0.0)),
            max_delay: Duration::from_secs_f64(max_delay_secs.max(min_delay_secs.max(0.0))),
        }
    }

    /// Acquire a navigation slot, sleeping as long as politeness
    /// requires.
    pub async fn acquire(&self) {
        let delay = self.next_delay();
        sleep(delay).await;
    }

    /// Compute the wait for the next navigation and debit the bucket.
    fn next_delay(&self) -> Duration {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * state.refill_per_sec).min(state.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            let jitter_range = self.max_delay.saturating_sub(self.min_delay);
            self.min_delay + jitter_range.mul_f64(jitter())
        } else {
            // Bucket empty: wait for a token to accrue, plus the floor.
            let wait = (1.0 - state.tokens) / state.refill_per_sec;
            state.tokens = 0.0;
            Duration::from_secs_f64(wait) + self.min_delay
        }
    }
}

/// Pseudo-random factor in [0, 1) derived from the clock; real
/// randomness is unnecessary for jitter.
fn jitter() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    f64::from(nanos % 1000) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_bucket_yields_jittered_delay() {
        let limiter = RateLimiter::new(60, 0.5, 1.0);
        let delay = limiter.next_delay();
        assert!(delay >= Duration::from_secs_f64(0.5));
        assert!(delay <= Duration::from_secs_f64(1.0));
    }

    #[test]
    fn test_empty_bucket_waits_for_refill() {
        let limiter = RateLimiter::new(60, 0.0, 0.0);
        for _ in 0..60 {
            limiter.next_delay();
        }
        // Bucket drained; the next delay must include refill time.
        let delay = limiter.next_delay();
        assert!(delay > Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_completes() {
        let limiter = RateLimiter::new(60, 0.5, 1.0);
        limiter.acquire().await;
    }
}
