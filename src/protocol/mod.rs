//! 协议模块：聊天接口的请求体、响应信封与作业状态。
//!
//! # Chat Protocol Module
//!
//! The agent service runs chats as asynchronous jobs:
//!
//! 1. `POST /chat` schedules a job and returns its `(conversation_id, chat_id)`
//! 2. `GET /chat/retrieve` reports the job status until it reaches `completed`
//! 3. `GET /chat/message/list` returns every message the job produced
//!
//! Each response is decoded into a tagged result ([`SubmitResult`],
//! [`StatusResult`], [`MessageListResult`]) so callers match on variants instead
//! of probing JSON keys.

pub mod request;
pub mod response;

pub use request::ChatRequest;
pub use response::{
    ChatData, ChatJob, ChatStatus, Envelope, LastError, MessageListResult, StatusResult,
    SubmitResult,
};

/// Schedule a chat job.
pub const CHAT_PATH: &str = "/chat";
/// Poll a job's status.
pub const RETRIEVE_PATH: &str = "/chat/retrieve";
/// List the messages produced by a job.
pub const MESSAGE_LIST_PATH: &str = "/chat/message/list";
