//! Chat message format of the agent service

use serde::{Deserialize, Serialize};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// What a message is for. Only `question` and `answer` matter to this client;
/// everything the agent emits around them (tool traces, follow-up suggestions,
/// verbose events) is kept apart from the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Question,
    Answer,
    FunctionCall,
    ToolOutput,
    ToolResponse,
    FollowUp,
    Verbose,
    #[default]
    #[serde(other)]
    Other,
}

/// Content encoding of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    ObjectString,
    Card,
    #[default]
    #[serde(other)]
    Other,
}

/// Message sent along with a chat submission.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMessage {
    pub content_type: ContentType,
    pub content: String,
    pub role: MessageRole,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
}

impl OutgoingMessage {
    /// A plain-text user question.
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Text,
            content: text.into(),
            role: MessageRole::User,
            name: "User".to_string(),
            kind: MessageType::Question,
        }
    }
}

/// One entry of a fetched message list. Unknown or missing fields fall back to
/// defaults so that a single odd entry never breaks the whole list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type", default)]
    pub kind: MessageType,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn new(kind: MessageType, content_type: ContentType, content: impl Into<String>) -> Self {
        Self {
            kind,
            content_type,
            content: Some(content.into()),
        }
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn is_text_answer(&self) -> bool {
        self.kind == MessageType::Answer && self.content_type == ContentType::Text
    }
}
