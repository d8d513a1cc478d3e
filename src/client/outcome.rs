use crate::error::{Error, ErrorKind};

/// What the presentation layer receives: display text plus a success flag.
///
/// On failure `text` is a localized message, never raw error internals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResult {
    pub text: String,
    pub success: bool,
    /// Failure category, `None` on success.
    pub kind: Option<ErrorKind>,
}

impl ExchangeResult {
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
            kind: None,
        }
    }

    pub fn from_error(err: &Error) -> Self {
        Self {
            text: err.user_message(),
            success: false,
            kind: Some(err.kind()),
        }
    }

    /// Last-resort failure for anything that escaped the exchange itself.
    pub fn aborted(detail: impl std::fmt::Display) -> Self {
        Self {
            text: format!("起卦失败: {}", detail),
            success: false,
            kind: Some(ErrorKind::Unclassified),
        }
    }

    pub fn into_parts(self) -> (String, bool) {
        (self.text, self.success)
    }
}

impl From<ExchangeResult> for (String, bool) {
    fn from(result: ExchangeResult) -> Self {
        result.into_parts()
    }
}
