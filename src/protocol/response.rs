//! Response envelopes of the chat endpoints, decoded into one tagged result per endpoint.

use crate::types::message::ChatMessage;
use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

const UNKNOWN_ERROR: &str = "未知错误";

/// `{code, msg, data}` wrapper shared by every endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: i64,
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    fn message(&self) -> String {
        self.msg
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(UNKNOWN_ERROR)
            .to_string()
    }
}

/// Remote job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Created,
    InProgress,
    Completed,
    Failed,
    RequiresAction,
    Canceled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ChatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Created => "created",
            ChatStatus::InProgress => "in_progress",
            ChatStatus::Completed => "completed",
            ChatStatus::Failed => "failed",
            ChatStatus::RequiresAction => "requires_action",
            ChatStatus::Canceled => "canceled",
            ChatStatus::Unknown => "unknown",
        }
    }

    /// States the job never leaves and that carry no answer.
    ///
    /// `requires_action` waits for client-side tool output, which this client never sends.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            ChatStatus::Failed | ChatStatus::Canceled | ChatStatus::RequiresAction
        )
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

/// `data` of the submit and retrieve endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub status: ChatStatus,
    pub last_error: Option<LastError>,
}

/// Handle of one remote chat job. Lives for a single exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatJob {
    pub conversation_id: String,
    pub chat_id: String,
}

impl ChatJob {
    pub fn query(&self) -> [(&str, &str); 2] {
        [
            ("conversation_id", self.conversation_id.as_str()),
            ("chat_id", self.chat_id.as_str()),
        ]
    }
}

/// Outcome of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    Accepted(ChatJob),
    Rejected { code: i64, message: String },
}

impl SubmitResult {
    pub fn from_body(body: &Value) -> Result<Self> {
        let env = Envelope::<ChatData>::deserialize(body)?;
        if env.code != 0 {
            return Ok(SubmitResult::Rejected {
                code: env.code,
                message: env.message(),
            });
        }

        let data = env.data.unwrap_or_default();
        if data.id.is_empty() || data.conversation_id.is_empty() {
            return Err(Error::protocol_with_context(
                "submission accepted without chat identifiers",
                ErrorContext::new()
                    .with_field_path("data.id, data.conversation_id")
                    .with_source("submit"),
            ));
        }

        Ok(SubmitResult::Accepted(ChatJob {
            conversation_id: data.conversation_id,
            chat_id: data.id,
        }))
    }
}

/// Outcome of one `GET /chat/retrieve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusResult {
    Pending(ChatStatus),
    Completed,
    Failed { status: ChatStatus, message: String },
    Rejected { code: i64, message: String },
}

impl StatusResult {
    pub fn from_body(body: &Value) -> Result<Self> {
        let env = Envelope::<ChatData>::deserialize(body)?;
        if env.code != 0 {
            return Ok(StatusResult::Rejected {
                code: env.code,
                message: env.message(),
            });
        }

        let data = env.data.ok_or_else(|| {
            Error::protocol_with_context(
                "status response without data",
                ErrorContext::new()
                    .with_field_path("data")
                    .with_source("retrieve"),
            )
        })?;

        Ok(match data.status {
            ChatStatus::Completed => StatusResult::Completed,
            status if status.is_terminal_failure() => {
                let message = data
                    .last_error
                    .map(|e| e.msg)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("chat {}", status));
                StatusResult::Failed { status, message }
            }
            status => StatusResult::Pending(status),
        })
    }
}

/// Outcome of `GET /chat/message/list`.
#[derive(Debug, Clone)]
pub enum MessageListResult {
    Listed(Vec<ChatMessage>),
    Rejected { code: i64, message: String },
    /// Envelope without a usable `data` array.
    Malformed,
}

impl MessageListResult {
    /// Never fails: entries that are not message objects are skipped.
    ///
    /// Unlike the other endpoints, a list without a `code` is not trusted.
    pub fn from_body(body: &Value) -> Self {
        if body.get("code").and_then(Value::as_i64).is_none() {
            return MessageListResult::Malformed;
        }
        let env = match Envelope::<Vec<Value>>::deserialize(body) {
            Ok(env) => env,
            Err(_) => return MessageListResult::Malformed,
        };
        if env.code != 0 {
            return MessageListResult::Rejected {
                code: env.code,
                message: env.message(),
            };
        }

        match env.data {
            Some(items) => MessageListResult::Listed(
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(index, item)| match ChatMessage::deserialize(item) {
                        Ok(message) => Some(message),
                        Err(e) => {
                            debug!(index, error = %e, "skipping unreadable message entry");
                            None
                        }
                    })
                    .collect(),
            ),
            None => MessageListResult::Malformed,
        }
    }
}
