//! Retry policy for transient server errors.
//!
//! Retries happen at the request execution level: the transport re-sends the same
//! request after a backoff when the response status is in the transient set.

use reqwest::Method;
use std::time::Duration;

/// Configuration for retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub retry_on_status: Vec<u16>,
    pub retry_methods: Vec<Method>,
}

impl RetryConfig {
    pub fn new() -> Self {
        Self {
            max_retries: 5,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(120),
            retry_on_status: vec![500, 502, 503, 504],
            retry_methods: vec![Method::GET, Method::POST],
        }
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    /// No retries at all.
    pub fn disabled() -> Self {
        Self::new().with_max_retries(0)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Exponential backoff: min_delay * 2^attempt, capped at max_delay.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.min_delay.as_millis() as u64;
        let cap = self.config.max_delay.as_millis() as u64;

        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(base.saturating_mul(factor).min(cap))
    }

    /// Delay before the next attempt, or `None` when the response must be returned as is.
    ///
    /// `attempt` is the zero-based index of the attempt that just completed.
    pub fn should_retry(&self, method: &Method, status: u16, attempt: u32) -> Option<Duration> {
        if attempt >= self.config.max_retries {
            return None;
        }
        if !self.config.retry_methods.contains(method) {
            return None;
        }
        if !self.is_transient(status) {
            return None;
        }
        Some(self.backoff(attempt))
    }

    pub fn is_transient(&self, status: u16) -> bool {
        self.config.retry_on_status.contains(&status)
    }
}
