//! Chat submission body

use crate::types::message::OutgoingMessage;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub bot_id: String,
    pub user_id: String,
    pub additional_messages: Vec<OutgoingMessage>,
}

impl ChatRequest {
    /// One-shot question under a fresh user id.
    pub fn question(bot_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            user_id: fresh_user_id(),
            additional_messages: vec![OutgoingMessage::question(question)],
        }
    }
}

/// Time-derived user id, so that consecutive exchanges never share a conversation user.
pub fn fresh_user_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("user_{}", millis)
}
