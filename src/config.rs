//! 配置模块：访问凭据与客户端调优参数。
//!
//! Client configuration: the static credential and the tuning knobs for the
//! transport, rate limiter and polling loop. Everything has a production default
//! and can be overridden through environment variables.

use crate::resilience::rate_limiter::RateLimiterConfig;
use crate::transport::retry::RetryConfig;
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.coze.cn/v3";
const KEYRING_SERVICE: &str = "coze-divination";

/// Bearer token plus the agent (bot) it talks to. Read-only once built.
#[derive(Clone)]
pub struct Credential {
    token: String,
    bot_id: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, bot_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            bot_id: bot_id.into(),
        }
    }

    /// Resolve the credential from the environment.
    ///
    /// The bot id comes from `COZE_BOT_ID`. The token is looked up in the OS keyring
    /// first (service `coze-divination`, user = bot id), then in `COZE_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let bot_id = non_empty_env("COZE_BOT_ID").ok_or_else(|| {
            Error::configuration_with_context(
                "missing agent identifier",
                ErrorContext::new()
                    .with_field_path("COZE_BOT_ID")
                    .with_source("credential"),
            )
        })?;

        let token = Self::token_from_keyring(&bot_id)
            .or_else(|| non_empty_env("COZE_API_TOKEN"))
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "missing API token",
                    ErrorContext::new()
                        .with_field_path("COZE_API_TOKEN")
                        .with_details("not found in keyring or environment")
                        .with_source("credential"),
                )
            })?;

        Ok(Self { token, bot_id })
    }

    fn token_from_keyring(bot_id: &str) -> Option<String> {
        let entry = Entry::new(KEYRING_SERVICE, bot_id).ok()?;
        entry.get_password().ok().filter(|t| !t.trim().is_empty())
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("bot_id", &self.bot_id)
            .finish()
    }
}

/// Tuning knobs for one client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Maximum idle connections kept per host.
    ///
    /// This caps the connections kept for reuse, not the connections open at
    /// once. Exchanges are serialized, so one client rarely holds more than one.
    pub pool_size: usize,
    pub retry: RetryConfig,
    pub rate_limit: RateLimiterConfig,
    /// Timeout for the job submission call.
    pub submit_timeout: Duration,
    /// Timeout for status and message reads.
    pub request_timeout: Duration,
    /// Sleep between two status checks.
    pub poll_interval: Duration,
    /// Deadline for the whole polling phase, measured from its start.
    pub poll_timeout: Duration,
    pub proxy_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pool_size: 10,
            retry: RetryConfig::default(),
            rate_limit: RateLimiterConfig::default(),
            submit_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            poll_timeout: Duration::from_secs(60),
            proxy_url: None,
        }
    }
}

impl ClientConfig {
    /// Defaults, overridden by any `DIVINATION_*` variable that parses.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(url) = non_empty_env("DIVINATION_BASE_URL") {
            cfg.base_url = url;
        }
        if let Some(n) = parse_env::<usize>("DIVINATION_POOL_SIZE") {
            cfg.pool_size = n.max(1);
        }
        if let Some(n) = parse_env::<u32>("DIVINATION_MAX_RETRIES") {
            cfg.retry.max_retries = n;
        }
        if let Some(ms) = parse_env::<u64>("DIVINATION_MIN_INTERVAL_MS") {
            cfg.rate_limit.min_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_env::<u64>("DIVINATION_SUBMIT_TIMEOUT_SECS") {
            cfg.submit_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = parse_env::<u64>("DIVINATION_HTTP_TIMEOUT_SECS") {
            cfg.request_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(ms) = parse_env::<u64>("DIVINATION_POLL_INTERVAL_MS") {
            cfg.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_env::<u64>("DIVINATION_POLL_TIMEOUT_SECS") {
            cfg.poll_timeout = Duration::from_secs(secs);
        }
        cfg.proxy_url = non_empty_env("DIVINATION_PROXY_URL");

        cfg
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.rate_limit.min_interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Check the base URL and normalize it (no trailing slash).
    pub fn validate(&mut self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                "invalid base URL",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(format!("{}: {}", self.base_url, e))
                    .with_source("client_config"),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                "base URL must use http or https",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(self.base_url.clone())
                    .with_source("client_config"),
            ));
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}
