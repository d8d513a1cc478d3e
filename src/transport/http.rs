use crate::clock::Clock;
use crate::config::{ClientConfig, Credential};
use crate::resilience::rate_limiter::RateLimiter;
use crate::transport::retry::RetryPolicy;
use crate::transport::TransportError;
use crate::Result;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Proxy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What a request carries besides its headers.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Empty,
    Json(&'a serde_json::Value),
    Query(&'a [(&'a str, &'a str)]),
}

/// Successful response: HTTP status plus the parsed JSON body.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: serde_json::Value,
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    /// Shared with the client; re-sent attempts are dispatches too.
    rate_limiter: Option<Arc<RateLimiter>>,
    default_timeout: Duration,
}

impl HttpTransport {
    /// Build the pooled client. The pool lives as long as the transport.
    pub fn new(config: &ClientConfig, credential: &Credential, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.pool_size.max(1))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &config.proxy_url {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!(proxy = proxy_url.as_str(), error = %e, "ignoring invalid proxy URL"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: credential.token().to_string(),
            retry: RetryPolicy::new(config.retry.clone()),
            clock,
            rate_limiter: None,
            default_timeout: config.request_timeout,
        })
    }

    /// Space every retry attempt through `limiter`.
    ///
    /// The first attempt of a logical request is throttled by the caller; each
    /// re-send waits out the backoff and then the limiter, and records its own
    /// dispatch time.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        payload: Payload<'_>,
        timeout: Duration,
    ) -> reqwest::RequestBuilder {
        let req = self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .timeout(timeout);

        match payload {
            Payload::Empty => req,
            Payload::Json(body) => req.json(body),
            Payload::Query(params) => req.query(params),
        }
    }

    /// Send one logical request, re-sending it while the server answers with a
    /// transient status and the retry budget allows.
    ///
    /// `timeout` bounds each attempt; `None` uses the configured default.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Payload<'_>,
        timeout: Option<Duration>,
    ) -> Result<HttpReply> {
        let url = format!("{}{}", self.base_url, path);
        let timeout = timeout.unwrap_or(self.default_timeout);
        let mut attempt: u32 = 0;

        loop {
            let start = Instant::now();
            let response = self
                .build_request(method.clone(), &url, payload, timeout)
                .send()
                .await
                .map_err(|e| TransportError::classify(e, timeout))?;
            let status = response.status().as_u16();

            if let Some(delay) = self.retry.should_retry(&method, status, attempt) {
                warn!(
                    http_status = status,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    path,
                    "transient server error, retrying"
                );
                drop(response);
                self.clock.sleep(delay).await;
                if let Some(limiter) = &self.rate_limiter {
                    limiter.throttle().await;
                }
                attempt += 1;
                continue;
            }

            if !response.status().is_success() {
                if self.retry.is_transient(status) {
                    return Err(TransportError::RetriesExhausted {
                        status,
                        attempts: attempt + 1,
                    }
                    .into());
                }
                let body = response.text().await.unwrap_or_default();
                return Err(TransportError::Status { status, body }.into());
            }

            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| TransportError::classify(e, timeout))?;

            debug!(
                http_status = status,
                method = method.as_str(),
                path,
                attempts = attempt + 1,
                duration_ms = start.elapsed().as_millis() as u64,
                "request completed"
            );

            return Ok(HttpReply { status, body });
        }
    }
}
