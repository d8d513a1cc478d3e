use crate::client::core::DivinationClient;
use crate::clock::{system_clock, Clock};
use crate::config::{ClientConfig, Credential};
use crate::resilience::rate_limiter::RateLimiter;
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Builder for creating clients with custom configuration.
///
/// Anything left unset is resolved from the environment at [`build`](Self::build) time.
pub struct DivinationClientBuilder {
    config: Option<ClientConfig>,
    credential: Option<Credential>,
    clock: Option<Arc<dyn Clock>>,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
}

impl DivinationClientBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            credential: None,
            clock: None,
            base_url_override: None,
        }
    }

    /// Use this configuration instead of [`ClientConfig::from_env`].
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use this credential instead of [`Credential::from_env`].
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Inject a time source. Default is the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Override the configured base URL.
    ///
    /// This is primarily for testing with mock servers.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    /// Build the client. The connection pool is created here, once.
    pub fn build(self) -> Result<DivinationClient> {
        let credential = match self.credential {
            Some(c) => c,
            None => Credential::from_env()?,
        };
        if credential.token().trim().is_empty() || credential.bot_id().trim().is_empty() {
            return Err(Error::configuration_with_context(
                "credential has an empty token or bot id",
                ErrorContext::new().with_source("client_builder"),
            ));
        }

        let mut config = self.config.unwrap_or_else(ClientConfig::from_env);
        if let Some(url) = self.base_url_override {
            config.base_url = url;
        }
        config.validate()?;

        let clock = self.clock.unwrap_or_else(system_clock);
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone(), clock.clone()));
        let transport = Arc::new(
            HttpTransport::new(&config, &credential, clock.clone())?
                .with_rate_limiter(rate_limiter.clone()),
        );

        debug!(
            base_url = config.base_url.as_str(),
            pool_size = config.pool_size,
            max_retries = config.retry.max_retries,
            "divination client built"
        );

        Ok(DivinationClient {
            config,
            credential,
            transport,
            rate_limiter,
            clock,
            exchange_guard: tokio::sync::Mutex::new(()),
            last_response: Mutex::new(None),
        })
    }
}

impl Default for DivinationClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
