use crate::client::outcome::ExchangeResult;
use crate::clock::Clock;
use crate::config::{ClientConfig, Credential};
use crate::resilience::rate_limiter::{RateLimiter, RateLimiterSnapshot};
use crate::transport::HttpTransport;
use crate::Result;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tracing::error;

/// Client for the divination agent.
///
/// One instance owns one connection pool and one rate limiter for its whole life.
/// Exchanges through the same instance run one at a time.
pub struct DivinationClient {
    pub(crate) config: ClientConfig,
    pub(crate) credential: Credential,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) rate_limiter: Arc<RateLimiter>,
    pub(crate) clock: Arc<dyn Clock>,
    /// Held for the duration of an exchange: at most one chat job is active.
    pub(crate) exchange_guard: tokio::sync::Mutex<()>,
    /// Raw payload of the last message-list fetch, for diagnostics.
    pub(crate) last_response: Mutex<Option<serde_json::Value>>,
}

impl DivinationClient {
    /// Build a client from environment configuration and credentials.
    pub fn from_env() -> Result<Self> {
        crate::client::builder::DivinationClientBuilder::new().build()
    }

    pub fn builder() -> crate::client::builder::DivinationClientBuilder {
        crate::client::builder::DivinationClientBuilder::new()
    }

    /// Ask a question and wait for the answer or a terminal failure.
    ///
    /// Never panics and never returns an error: every outcome is folded into an
    /// [`ExchangeResult`].
    pub async fn get_divination(&self, question: &str) -> ExchangeResult {
        guarded(self.run_exchange(question)).await
    }

    /// Raw message-list payload captured by the last completed fetch.
    pub fn last_raw_response(&self) -> Option<serde_json::Value> {
        match self.last_response.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn store_raw_response(&self, body: serde_json::Value) {
        match self.last_response.lock() {
            Ok(mut slot) => *slot = Some(body),
            Err(poisoned) => *poisoned.into_inner() = Some(body),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn bot_id(&self) -> &str {
        self.credential.bot_id()
    }

    /// Current rate limiter state.
    pub async fn rate_limiter_snapshot(&self) -> RateLimiterSnapshot {
        self.rate_limiter.snapshot().await
    }
}

/// Turn a panic inside the exchange into a failure result.
async fn guarded<F>(fut: F) -> ExchangeResult
where
    F: Future<Output = ExchangeResult>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let detail = panic_detail(payload.as_ref());
            error!(detail = detail.as_str(), "exchange aborted");
            ExchangeResult::aborted(detail)
        }
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
