//! # coze-divination
//!
//! 占卜功能的客户端运行时：向托管的智能体服务提交问题，轮询作业直至完成，并提取最终回答。
//!
//! Client runtime for a divination feature backed by a hosted chat-agent service
//! that works asynchronously: a question is submitted as a chat job, the job is
//! polled until it completes, and the final answer is picked out of the messages
//! the job produced.
//!
//! ## Key Features
//!
//! - **One-call facade**: [`DivinationClient::get_divination`] runs a full exchange and
//!   always returns an [`ExchangeResult`], never an error
//! - **Client-side rate limiting**: a single minimum-interval limiter spaces every
//!   request the client sends
//! - **Pooled transport**: connections are reused across the many polling calls of an
//!   exchange; transient 5xx responses are retried with exponential backoff
//! - **Deterministic timing**: all waits go through an injectable [`clock::Clock`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coze_divination::DivinationClient;
//!
//! #[tokio::main]
//! async fn main() -> coze_divination::Result<()> {
//!     // COZE_API_TOKEN and COZE_BOT_ID must be set (or the token stored in the keyring).
//!     let client = DivinationClient::from_env()?;
//!
//!     let result = client.get_divination("我今天能赚钱吗？").await;
//!     if result.success {
//!         println!("{}", result.text);
//!     } else {
//!         eprintln!("{}", result.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Facade, builder and the chat session state machine |
//! | [`protocol`] | Endpoint paths, request body and tagged response results |
//! | [`extract`] | Answer selection from a message list |
//! | [`transport`] | Pooled HTTP transport with retry |
//! | [`resilience`] | Client-side rate limiting |
//! | [`clock`] | Time source abstraction |
//! | [`config`] | Credential and tuning knobs |
//! | [`types`] | Message types |

pub mod client;
pub mod clock;
pub mod config;
pub mod extract;
pub mod protocol;
pub mod resilience;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{DivinationClient, DivinationClientBuilder, ExchangeResult};
pub use config::{ClientConfig, Credential};
pub use extract::extract_answer;
pub use types::message::{ChatMessage, ContentType, MessageType};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorKind};
