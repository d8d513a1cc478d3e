//! 类型系统模块：智能体服务的消息类型。
//!
//! # Types Module
//!
//! | Type | Description |
//! |------|-------------|
//! | [`OutgoingMessage`] | Message attached to a chat submission |
//! | [`ChatMessage`] | Entry of a fetched message list |
//! | [`MessageType`] | question / answer / auxiliary agent output |
//! | [`ContentType`] | text / object_string / card |
//!
//! ## Example
//!
//! ```rust
//! use coze_divination::types::{ChatMessage, ContentType, MessageType, OutgoingMessage};
//!
//! let question = OutgoingMessage::question("今天宜出行吗？");
//! assert_eq!(question.kind, MessageType::Question);
//!
//! let answer = ChatMessage::new(MessageType::Answer, ContentType::Text, "宜");
//! assert!(answer.is_text_answer());
//! ```

pub mod message;

pub use message::{ChatMessage, ContentType, MessageRole, MessageType, OutgoingMessage};
