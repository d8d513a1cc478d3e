//! HTTP transport: pooled connections, bearer auth, per-call timeouts and
//! retry of transient server errors.

pub mod http;
pub mod retry;

pub use http::{HttpReply, HttpTransport, Payload};
pub use retry::{RetryConfig, RetryPolicy};

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("HTTP {status} persisted after {attempts} attempts")]
    RetriesExhausted { status: u16, attempts: u32 },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Sort a reqwest failure into timeout / connect / other.
    pub(crate) fn classify(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else if err.is_connect() {
            TransportError::Connect(err)
        } else {
            TransportError::Http(err)
        }
    }
}
