//! 聊天会话协议：提交问题、轮询作业状态、拉取消息列表。
//!
//! One exchange walks `Submitting -> Polling -> Fetching -> Done`; any step can
//! end it early with an error, which is converted to a localized failure at the
//! end of [`DivinationClient::run_exchange`].

use crate::client::outcome::ExchangeResult;
use crate::extract::extract_answer;
use crate::protocol::{
    ChatJob, ChatRequest, MessageListResult, StatusResult, SubmitResult, CHAT_PATH,
    MESSAGE_LIST_PATH, RETRIEVE_PATH,
};
use crate::transport::Payload;
use crate::{Error, Result};
use reqwest::Method;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::core::DivinationClient;

impl DivinationClient {
    /// Run one full question-to-answer exchange.
    pub async fn run_exchange(&self, question: &str) -> ExchangeResult {
        let _active = self.exchange_guard.lock().await;
        let exchange_id = Uuid::new_v4().to_string();
        let span = info_span!("exchange", id = exchange_id.as_str());

        async {
            let start = Instant::now();
            match self.exchange(question).await {
                Ok(answer) => {
                    info!(
                        duration_ms = start.elapsed().as_millis() as u64,
                        answer_chars = answer.chars().count(),
                        "exchange succeeded"
                    );
                    ExchangeResult::answer(answer)
                }
                Err(e) => {
                    warn!(
                        duration_ms = start.elapsed().as_millis() as u64,
                        kind = ?e.kind(),
                        error = %e,
                        "exchange failed"
                    );
                    ExchangeResult::from_error(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn exchange(&self, question: &str) -> Result<String> {
        let job = self.submit(question).await?;
        self.poll_until_complete(&job).await?;
        let body = self.fetch_messages(&job).await?;

        match MessageListResult::from_body(&body) {
            MessageListResult::Listed(messages) => {
                let answer = extract_answer(&messages).map(str::to_string);
                if answer.is_none() {
                    info!(messages = messages.len(), "no text answer in message list");
                }
                answer.ok_or(Error::NoAnswer)
            }
            MessageListResult::Rejected { code, message } => {
                warn!(code, message = message.as_str(), "message list rejected");
                Err(Error::NoAnswer)
            }
            MessageListResult::Malformed => {
                warn!("message list without code or data array");
                Err(Error::NoAnswer)
            }
        }
    }

    /// Schedule the chat job. A non-zero response code ends the exchange here.
    async fn submit(&self, question: &str) -> Result<ChatJob> {
        self.rate_limiter.throttle().await;

        let request = ChatRequest::question(self.credential.bot_id(), question);
        let body = serde_json::to_value(&request)?;
        let reply = self
            .transport
            .request(
                Method::POST,
                CHAT_PATH,
                Payload::Json(&body),
                Some(self.config.submit_timeout),
            )
            .await?;

        match SubmitResult::from_body(&reply.body)? {
            SubmitResult::Accepted(job) => {
                info!(
                    conversation_id = job.conversation_id.as_str(),
                    chat_id = job.chat_id.as_str(),
                    "chat job submitted"
                );
                Ok(job)
            }
            SubmitResult::Rejected { code, message } => Err(Error::Api { code, message }),
        }
    }

    /// Poll until `completed`. Bounded by wall-clock time from the first check,
    /// not by a number of checks.
    async fn poll_until_complete(&self, job: &ChatJob) -> Result<()> {
        let started = self.clock.now();
        let deadline = self.config.poll_timeout;
        let query = job.query();
        let mut checks: u32 = 0;

        let past_deadline = || self.clock.now().saturating_duration_since(started) > deadline;

        loop {
            // Checked again after the limiter wait, which may carry us past the deadline.
            let timed_out = past_deadline() || {
                self.rate_limiter.throttle().await;
                past_deadline()
            };
            if timed_out {
                warn!(checks, timeout_ms = deadline.as_millis() as u64, "chat job polling timed out");
                return Err(Error::PollTimeout(deadline));
            }

            let reply = self
                .transport
                .request(Method::GET, RETRIEVE_PATH, Payload::Query(&query), None)
                .await?;
            checks += 1;

            match StatusResult::from_body(&reply.body)? {
                StatusResult::Completed => {
                    debug!(checks, "chat job completed");
                    return Ok(());
                }
                StatusResult::Pending(status) => {
                    debug!(checks, status = status.as_str(), "chat job pending");
                }
                StatusResult::Failed { status, message } => {
                    return Err(Error::JobFailed {
                        status: status.to_string(),
                        message,
                    });
                }
                StatusResult::Rejected { code, message } => {
                    return Err(Error::Api { code, message });
                }
            }

            self.clock.sleep(self.config.poll_interval).await;
        }
    }

    /// Fetch the message list and keep the raw payload for diagnostics.
    async fn fetch_messages(&self, job: &ChatJob) -> Result<serde_json::Value> {
        self.rate_limiter.throttle().await;

        let query = job.query();
        let reply = self
            .transport
            .request(Method::GET, MESSAGE_LIST_PATH, Payload::Query(&query), None)
            .await?;

        self.store_raw_response(reply.body.clone());
        Ok(reply.body)
    }
}
