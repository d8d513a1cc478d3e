//! Answer selection from a fetched message list.

use crate::types::message::ChatMessage;

/// Content of the last `answer`/`text` message, if any.
///
/// The service appends messages in chronological order, so the last qualifying
/// entry is the most recent answer.
pub fn extract_answer(messages: &[ChatMessage]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.is_text_answer())
        .map(ChatMessage::content)
}
