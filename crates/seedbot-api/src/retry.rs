//! Backoff schedule for transient provider errors.

use rand::Rng;
use std::time::Duration;

/// How the client retries requests that failed with a transient error.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = single attempt).
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor applied per attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// A single attempt with no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total attempts including the first.
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retrying after the zero-based `attempt` failed.
    ///
    /// A server-provided `Retry-After` wins, capped at `max_delay_ms`.
    /// Otherwise `initial_delay_ms * backoff_factor^attempt` with ±25% jitter.
    pub fn delay_for(&self, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
        if let Some(server_ms) = retry_after_ms {
            return Duration::from_millis(server_ms.min(self.max_delay_ms));
        }

        let exp = self.initial_delay_ms as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = exp.min(self.max_delay_ms as f64);
        let jitter = rand::rng().random_range(0.75..=1.25);
        let ms = ((capped * jitter) as u64).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}
