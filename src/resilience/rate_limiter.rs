use crate::clock::Clock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RateLimiterSnapshot {
    pub min_interval_ms: u64,
    /// Time since the last permitted dispatch (ms), if any request went out yet.
    pub since_last_ms: Option<u64>,
    /// Estimated wait before the next dispatch is allowed (ms).
    pub estimated_wait_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Minimum spacing between two dispatches.
    pub min_interval: Duration,
}

impl RateLimiterConfig {
    pub fn new() -> Self {
        Self {
            min_interval: Duration::from_millis(500),
        }
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct State {
    /// Instant of the most recently permitted dispatch.
    last: Option<Instant>,
}

/// Minimum-interval limiter shared by every request a client issues.
///
/// - The first dispatch never waits
/// - The timestamp is recorded after the wait, so it reflects the real dispatch time
/// - The lock is held across the wait, so concurrent callers are spaced too
pub struct RateLimiter {
    cfg: RateLimiterConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl RateLimiter {
    pub fn new(cfg: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            cfg,
            clock,
            state: Mutex::new(State::default()),
        }
    }

    fn wait_for(&self, st: &State, now: Instant) -> Duration {
        match st.last {
            Some(last) => self
                .cfg
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Wait until the next dispatch is allowed, then record it.
    pub async fn throttle(&self) {
        let mut st = self.state.lock().await;

        let wait = self.wait_for(&st, self.clock.now());
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "rate limiter delaying dispatch");
            self.clock.sleep(wait).await;
        }

        st.last = Some(self.clock.now());
    }

    /// Instant of the last permitted dispatch.
    pub async fn last_dispatch(&self) -> Option<Instant> {
        self.state.lock().await.last
    }

    pub async fn snapshot(&self) -> RateLimiterSnapshot {
        let st = self.state.lock().await;
        let now = self.clock.now();
        RateLimiterSnapshot {
            min_interval_ms: self.cfg.min_interval.as_millis() as u64,
            since_last_ms: st
                .last
                .map(|last| now.saturating_duration_since(last).as_millis() as u64),
            estimated_wait_ms: self.wait_for(&st, now).as_millis() as u64,
        }
    }
}
