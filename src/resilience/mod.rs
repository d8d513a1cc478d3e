//! 弹性模式模块：客户端侧限流。
//!
//! # Resilience Primitives Module
//!
//! The hosted agent service throttles aggressive clients, and a single exchange
//! produces many polling requests. The [`rate_limiter`] keeps a minimum spacing
//! between every request a client sends, whichever step of the exchange issued it.
//!
//! ```rust
//! use coze_divination::clock::system_clock;
//! use coze_divination::resilience::rate_limiter::{RateLimiter, RateLimiterConfig};
//! use std::time::Duration;
//!
//! # async fn demo() {
//! let config = RateLimiterConfig::new().with_min_interval(Duration::from_millis(500));
//! let limiter = RateLimiter::new(config, system_clock());
//!
//! limiter.throttle().await; // first dispatch goes out immediately
//! limiter.throttle().await; // waits until 500ms after the first
//! # }
//! ```

pub mod rate_limiter;
