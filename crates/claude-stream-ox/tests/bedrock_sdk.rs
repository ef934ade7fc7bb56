#![cfg(feature = "bedrock")]

use aws_sdk_bedrockruntime::{
    Client, Config,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
};
use claude_stream_ox::{Anthropic, ErrorKind, MessageRequest, StopReason};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path_regex},
};

const INVOKE_PATH: &str = r"^/model/anthropic\.claude-3-haiku-20240307-v1(:|%3A)0/invoke$";

fn client_for(server: &MockServer) -> Anthropic {
    let config = Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
        .endpoint_url(server.uri())
        .retry_config(RetryConfig::disabled())
        .build();
    Anthropic::bedrock(Client::from_conf(config))
}

#[tokio::test]
async fn invoke_model_sends_the_adapted_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(INVOKE_PATH))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_bdrk_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-haiku-20240307",
            "content": [{"type": "text", "text": "Hello from Bedrock"}],
            "stop_reason": "end_turn",
            "stop_sequence": null,
            "usage": {"input_tokens": 9, "output_tokens": 4}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .send_shorthand(&MessageRequest::shorthand("claude-3-haiku-20240307", "Hi"))
        .await
        .unwrap();

    assert_eq!(response.text(), "Hello from Bedrock");
    assert_eq!(response.stop_reason, Some(StopReason::EndTurn));

    let received = &server.received_requests().await.unwrap()[0];
    let body: serde_json::Value = serde_json::from_slice(&received.body).unwrap();
    assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
    assert!(body.get("model").is_none());
}

#[tokio::test]
async fn service_errors_keep_their_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(INVOKE_PATH))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("x-amzn-ErrorType", "ValidationException")
                .set_body_json(json!({"message": "max_tokens: field required"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .send_shorthand(&MessageRequest::shorthand("claude-3-haiku-20240307", "Hi"))
        .await
        .unwrap_err();

    let api = err.api_error().unwrap();
    assert_eq!(api.r#type, "invalid_request_error");
    assert_eq!(api.code, Some(400));
    assert!(api.message.starts_with("ValidationException"));
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(!err.is_retryable());
}
