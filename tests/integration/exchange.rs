//! End-to-end exchanges: submit, poll, fetch, extract

use super::mock_server::{
    message_list, millis, DispatchLog, MockServerFixture, BOT_ID, CHAT_ID, CONVERSATION_ID,
};
use coze_divination::ErrorKind;
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_immediately_completed_job_returns_answer() {
    let fixture = MockServerFixture::new().await;
    let submit = fixture.mock_submit_accepted().await;
    let status = fixture.mock_status("completed", 1).await;
    let list = message_list(json!([
        {"type": "question", "content_type": "text", "content": "我今天能赚钱吗？"},
        {"type": "answer", "content_type": "text", "content": "卦象显示：小有所得"}
    ]));
    let messages = fixture.mock_messages(list.clone(), 1).await;

    let client = fixture.create_test_client();
    let (text, success) = client.get_divination("我今天能赚钱吗？").await.into_parts();

    assert!(success);
    assert_eq!(text, "卦象显示：小有所得");
    submit.assert_async().await;
    status.assert_async().await;
    messages.assert_async().await;
    assert_eq!(client.last_raw_response(), Some(list));
}

#[tokio::test]
async fn test_submission_body_shape() {
    let fixture = MockServerFixture::new().await;
    let submit = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "bot_id": BOT_ID,
                "additional_messages": [{
                    "content_type": "text",
                    "content": "问姻缘",
                    "role": "user",
                    "name": "User",
                    "type": "question"
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":4000,"msg":"invalid bot"}"#)
            .expect(1)
            .create_async()
            .await
    };

    let client = fixture.create_test_client();
    let result = client.get_divination("问姻缘").await;

    submit.assert_async().await;
    assert!(!result.success);
}

#[tokio::test]
async fn test_api_error_skips_polling() {
    let fixture = MockServerFixture::new().await;
    let submit = fixture
        .mock_submit(json!({"code": 4000, "msg": "invalid bot"}), 1)
        .await;
    let status = fixture.mock_status("completed", 0).await;
    let messages = fixture.mock_messages(message_list(json!([])), 0).await;

    let client = fixture.create_test_client();
    let result = client.get_divination("问财运").await;

    assert_eq!(
        result.clone().into_parts(),
        ("API错误: invalid bot".to_string(), false)
    );
    assert_eq!(result.kind, Some(ErrorKind::Application));
    submit.assert_async().await;
    status.assert_async().await;
    messages.assert_async().await;
    assert!(client.last_raw_response().is_none());
}

#[tokio::test]
async fn test_never_completing_job_times_out() {
    let fixture = MockServerFixture::new().await;
    let _submit = fixture.mock_submit_accepted().await;
    // Checks at t=0.5s, 1.5s, 2.5s, 3.5s, 4.5s; the next would start after the 5s deadline.
    let status = fixture.mock_status("in_progress", 5).await;
    let messages = fixture.mock_messages(message_list(json!([])), 0).await;

    let config = fixture
        .config()
        .with_poll_timeout(Duration::from_secs(5))
        .with_poll_interval(Duration::from_secs(1))
        .with_min_request_interval(millis(500));
    let client = fixture.create_client_with(config);
    let result = client.get_divination("问事业").await;

    assert!(!result.success);
    assert_eq!(result.text, "等待响应超时，请稍后重试");
    assert_eq!(result.kind, Some(ErrorKind::Timeout));
    status.assert_async().await;
    messages.assert_async().await;
}

#[tokio::test]
async fn test_default_deadline_bounds_polling() {
    let fixture = MockServerFixture::new().await;
    let _submit = fixture.mock_submit_accepted().await;
    // 60s deadline, 1s interval, 0.5s spacing: checks at 0.5s .. 59.5s.
    let status = fixture.mock_status("created", 60).await;

    let client = fixture.create_test_client();
    let result = client.get_divination("问健康").await;

    assert_eq!(result.kind, Some(ErrorKind::Timeout));
    status.assert_async().await;
}

#[tokio::test]
async fn test_last_text_answer_is_selected() {
    let fixture = MockServerFixture::new().await;
    let _submit = fixture.mock_submit_accepted().await;
    let _status = fixture.mock_status("completed", 1).await;
    let _messages = fixture
        .mock_messages(
            message_list(json!([
                {"type": "question"},
                {"type": "answer", "content_type": "text", "content": "A"},
                {"type": "verbose", "content_type": "text", "content": "{\"msg_type\":\"generate_answer_finish\"}"},
                {"type": "answer", "content_type": "card", "content": "{}"},
                {"type": "answer", "content_type": "text", "content": "B"},
                {"type": "follow_up", "content_type": "text", "content": "还想问什么？"}
            ])),
            1,
        )
        .await;

    let client = fixture.create_test_client();
    let result = client.get_divination("问").await;

    assert_eq!(result.into_parts(), ("B".to_string(), true));
}

#[tokio::test]
async fn test_missing_answer_is_soft_failure_and_raw_is_kept() {
    let fixture = MockServerFixture::new().await;
    let _submit = fixture.mock_submit_accepted().await;
    let _status = fixture.mock_status("completed", 1).await;
    let list = message_list(json!([
        {"type": "question", "content_type": "text", "content": "问"},
        {"type": "follow_up", "content_type": "text", "content": "再问一次？"}
    ]));
    let _messages = fixture.mock_messages(list.clone(), 1).await;

    let client = fixture.create_test_client();
    let result = client.get_divination("问").await;

    assert_eq!(result.text, "未能获取占卜结果");
    assert!(!result.success);
    assert_eq!(result.kind, Some(ErrorKind::ExtractionMiss));

    let first = client.last_raw_response();
    let second = client.last_raw_response();
    assert_eq!(first, Some(list));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rejected_message_list_is_soft_failure() {
    let fixture = MockServerFixture::new().await;
    let _submit = fixture.mock_submit_accepted().await;
    let _status = fixture.mock_status("completed", 1).await;
    let body = json!({"code": 4100, "msg": "conversation expired"});
    let _messages = fixture.mock_messages(body.clone(), 1).await;

    let client = fixture.create_test_client();
    let result = client.get_divination("问").await;

    assert_eq!(result.text, "未能获取占卜结果");
    assert_eq!(client.last_raw_response(), Some(body));
}

#[tokio::test]
async fn test_failed_job_fails_fast() {
    let fixture = MockServerFixture::new().await;
    let _submit = fixture.mock_submit_accepted().await;
    let status = fixture
        .mock_status_body(
            json!({
                "code": 0,
                "data": {
                    "id": "chat-1",
                    "conversation_id": "conv-1",
                    "status": "failed",
                    "last_error": {"code": 4011, "msg": "quota exceeded"}
                }
            }),
            1,
        )
        .await;
    let messages = fixture.mock_messages(message_list(json!([])), 0).await;

    let client = fixture.create_test_client();
    let result = client.get_divination("问").await;

    assert_eq!(result.text, "API错误: quota exceeded");
    assert!(!result.success);
    status.assert_async().await;
    messages.assert_async().await;
}

#[tokio::test]
async fn test_requests_are_spaced_by_rate_limiter() {
    let fixture = MockServerFixture::new().await;
    let submit = fixture
        .mock_submit(
            json!({"code": 0, "data": {"id": "chat-1", "conversation_id": "conv-1"}}),
            2,
        )
        .await;
    let _status = fixture.mock_status("completed", 2).await;
    let _messages = fixture
        .mock_messages(
            message_list(json!([{"type": "answer", "content_type": "text", "content": "吉"}])),
            2,
        )
        .await;

    let client = fixture.create_test_client();
    assert!(client.get_divination("一问").await.success);
    // submit goes out at once; the status check and the fetch each wait out the spacing
    assert_eq!(fixture.clock.sleeps(), vec![millis(500), millis(500)]);

    assert!(client.get_divination("二问").await.success);
    // the next exchange's submission is spaced from the previous fetch too
    assert_eq!(fixture.clock.sleeps().len(), 5);
    assert!(fixture.clock.sleeps().iter().all(|d| *d == millis(500)));
    submit.assert_async().await;
}

#[tokio::test]
async fn test_retried_submit_is_spaced_from_next_request() {
    let fixture = MockServerFixture::new().await;
    let log = DispatchLog::default();
    let unavailable = fixture
        .mock_recorded("POST", "/chat", 503, json!({}), 1, &log)
        .await;
    let accepted = fixture
        .mock_recorded(
            "POST",
            "/chat",
            200,
            json!({"code": 0, "data": {"id": CHAT_ID, "conversation_id": CONVERSATION_ID}}),
            1,
            &log,
        )
        .await;
    let _status = fixture
        .mock_recorded(
            "GET",
            "/chat/retrieve",
            200,
            json!({"code": 0, "data": {"status": "completed"}}),
            1,
            &log,
        )
        .await;
    let _messages = fixture
        .mock_recorded(
            "GET",
            "/chat/message/list",
            200,
            message_list(json!([{"type": "answer", "content_type": "text", "content": "吉"}])),
            1,
            &log,
        )
        .await;

    let client = fixture.create_test_client();
    let result = client.get_divination("问").await;

    assert_eq!(result.into_parts(), ("吉".to_string(), true));
    assert_eq!(log.len(), 4);
    // The status check is spaced from the retried submission, not from the first attempt.
    assert_eq!(log.gaps(), vec![millis(500); 3]);
    unavailable.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn test_retries_honor_a_wider_spacing() {
    let fixture = MockServerFixture::new().await;
    let log = DispatchLog::default();
    let _unavailable = fixture
        .mock_recorded("POST", "/chat", 502, json!({}), 2, &log)
        .await;
    let _accepted = fixture
        .mock_recorded(
            "POST",
            "/chat",
            200,
            json!({"code": 0, "data": {"id": CHAT_ID, "conversation_id": CONVERSATION_ID}}),
            1,
            &log,
        )
        .await;
    let _status = fixture
        .mock_recorded(
            "GET",
            "/chat/retrieve",
            200,
            json!({"code": 0, "data": {"status": "completed"}}),
            1,
            &log,
        )
        .await;
    let _messages = fixture
        .mock_recorded(
            "GET",
            "/chat/message/list",
            200,
            message_list(json!([{"type": "answer", "content_type": "text", "content": "吉"}])),
            1,
            &log,
        )
        .await;

    let config = fixture.config().with_min_request_interval(Duration::from_secs(2));
    let client = fixture.create_client_with(config);
    assert!(client.get_divination("问").await.success);

    assert_eq!(log.gaps(), vec![Duration::from_secs(2); 4]);
}

#[tokio::test]
async fn test_no_status_check_after_deadline_when_spacing_exceeds_interval() {
    let fixture = MockServerFixture::new().await;
    let _submit = fixture.mock_submit_accepted().await;
    // Spacing dominates the 100ms interval: checks at 0.5s, 1.0s .. 4.5s. The limiter
    // would release the next one at 5.0s, past the 4.8s deadline.
    let status = fixture.mock_status("in_progress", 9).await;

    let config = fixture
        .config()
        .with_poll_timeout(Duration::from_millis(4_800))
        .with_poll_interval(millis(100))
        .with_min_request_interval(millis(500));
    let client = fixture.create_client_with(config);
    let result = client.get_divination("问").await;

    assert_eq!(result.text, "等待响应超时，请稍后重试");
    assert_eq!(result.kind, Some(ErrorKind::Timeout));
    status.assert_async().await;
}

#[tokio::test]
async fn test_unanswered_submission_times_out() {
    // Accepts connections and never writes a byte back.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let fixture = MockServerFixture::new().await;
    let mut config = fixture.config().with_base_url(format!("http://{}", addr));
    config.submit_timeout = millis(200);
    let client = fixture.create_client_with(config);

    let result = client.get_divination("问").await;

    assert_eq!(result.text, "请求超时，请检查网络连接后重试");
    assert_eq!(result.kind, Some(ErrorKind::Timeout));
    assert!(!result.success);
    // Timeouts are not retried.
    assert!(fixture.clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_connection_failure_is_localized() {
    let fixture = MockServerFixture::new().await;
    // Nothing listens on port 1.
    let config = fixture.config().with_base_url("http://127.0.0.1:1");
    let client = fixture.create_client_with(config);

    let result = client.get_divination("问").await;

    assert_eq!(result.text, "网络连接错误，请检查网络设置");
    assert_eq!(result.kind, Some(ErrorKind::Connection));
    assert!(!result.success);
}

#[tokio::test]
async fn test_persistent_server_error_on_submit() {
    let fixture = MockServerFixture::new().await;
    let submit = fixture.mock_http_status("POST", "/chat", 503, 6).await;

    let client = fixture.create_test_client();
    let result = client.get_divination("问").await;

    assert_eq!(result.text, "网络连接错误，请检查网络设置");
    submit.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_is_unclassified() {
    let fixture = MockServerFixture::new().await;
    let submit = fixture.mock_http_status("POST", "/chat", 401, 1).await;

    let client = fixture.create_test_client();
    let result = client.get_divination("问").await;

    assert!(result.text.starts_with("发生错误: "));
    assert_eq!(result.kind, Some(ErrorKind::Unclassified));
    submit.assert_async().await;
}
