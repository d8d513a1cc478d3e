use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "base_url", "data.conversation_id")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_config", "submit")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Broad failure categories, each with its own user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service answered with a non-zero code or a failed job.
    Application,
    /// A request or the polling phase ran out of time.
    Timeout,
    /// The network or the server was unreachable.
    Connection,
    /// The job completed but carried no usable answer.
    ExtractionMiss,
    Unclassified,
}

/// Unified error type for the divination client
#[derive(Debug, Error)]
pub enum Error {
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("chat job ended with status {status}: {message}")]
    JobFailed { status: String, message: String },

    #[error("chat job not completed within {0:?}")]
    PollTimeout(Duration),

    #[error("no answer message in the fetched message list")]
    NoAnswer,

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Protocol error: {message}{}", format_context(.context))]
    Protocol {
        message: String,
        context: ErrorContext,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn protocol_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Protocol {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Protocol { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Api { .. } | Error::JobFailed { .. } => ErrorKind::Application,
            Error::PollTimeout(_) => ErrorKind::Timeout,
            Error::NoAnswer => ErrorKind::ExtractionMiss,
            Error::Transport(TransportError::Timeout(_)) => ErrorKind::Timeout,
            Error::Transport(TransportError::Connect(_))
            | Error::Transport(TransportError::RetriesExhausted { .. }) => ErrorKind::Connection,
            _ => ErrorKind::Unclassified,
        }
    }

    /// Localized message shown to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } | Error::JobFailed { message, .. } => {
                format!("API错误: {}", message)
            }
            Error::PollTimeout(_) => "等待响应超时，请稍后重试".to_string(),
            Error::NoAnswer => "未能获取占卜结果".to_string(),
            Error::Transport(TransportError::Timeout(_)) => {
                "请求超时，请检查网络连接后重试".to_string()
            }
            _ if self.kind() == ErrorKind::Connection => "网络连接错误，请检查网络设置".to_string(),
            other => format!("发生错误: {}", other),
        }
    }
}
