use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use claude_stream_ox::{
    Anthropic, AnthropicRequestError, CancellationToken, CompletionRequest, Endpoint, ErrorKind,
    MessageRequest, StopReason, Transport,
    bedrock::{self, InvokeRequest},
    stream::ByteStream,
};
use futures_util::{StreamExt, stream};
use serde_json::{Value, json};

/// Answers the way `InvokeModel` does: request bodies are adapted with
/// `bedrock::prepare` and streamed payload parts are framed with
/// `bedrock::frame_chunk`.
#[derive(Debug, Default)]
struct BedrockScript {
    parts: Vec<Value>,
    body: Value,
    /// A service error raised after the last part.
    failure: Option<(&'static str, &'static str)>,
    invocations: Mutex<Vec<InvokeRequest>>,
}

impl BedrockScript {
    fn last_invocation(&self) -> (String, Value) {
        let invocations = self.invocations.lock().unwrap();
        let request = invocations.last().unwrap();
        let body = serde_json::from_slice(&request.body).unwrap();
        (request.model_id.clone(), body)
    }
}

#[async_trait]
impl Transport for BedrockScript {
    async fn send(&self, endpoint: &Endpoint, body: Value) -> Result<Bytes, AnthropicRequestError> {
        let request = bedrock::prepare(endpoint, body)?;
        self.invocations.lock().unwrap().push(request);
        Ok(Bytes::from(serde_json::to_vec(&self.body)?))
    }

    async fn send_stream(
        &self,
        endpoint: &Endpoint,
        body: Value,
    ) -> Result<ByteStream, AnthropicRequestError> {
        let request = bedrock::prepare(endpoint, body)?;
        self.invocations.lock().unwrap().push(request);

        let mut chunks = self
            .parts
            .iter()
            .map(|part| bedrock::frame_chunk(endpoint, part.to_string().as_bytes()))
            .collect::<Vec<_>>();
        if let Some((code, message)) = self.failure {
            chunks.push(Err(bedrock::api_error(Some(code), Some(message))));
        }
        Ok(stream::iter(chunks).boxed())
    }
}

fn client(script: BedrockScript) -> (Anthropic, Arc<BedrockScript>) {
    let script = Arc::new(script);
    let client = Anthropic::new(String::new()).with_transport(script.clone());
    (client, script)
}

fn message_parts() -> Vec<Value> {
    vec![
        json!({"type":"message_start","message":{"id":"msg_bdrk_01","type":"message","role":"assistant","model":"claude-3-haiku-20240307","content":[],"stop_reason":null,"stop_sequence":null,"usage":{"input_tokens":9,"output_tokens":1}}}),
        json!({"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}),
        json!({"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}),
        json!({"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":" from Bedrock"}}),
        json!({"type":"content_block_stop","index":0}),
        json!({"type":"message_delta","delta":{"stop_reason":"end_turn","stop_sequence":null},"usage":{"output_tokens":5}}),
        json!({"type":"message_stop","amazon-bedrock-invocationMetrics":{"inputTokenCount":9,"outputTokenCount":5,"invocationLatency":412,"firstByteLatency":198}}),
    ]
}

#[tokio::test]
async fn message_stream_assembles_over_bedrock() {
    let (client, script) = client(BedrockScript {
        parts: message_parts(),
        ..BedrockScript::default()
    });

    let mut stream = client
        .stream_shorthand(
            &MessageRequest::shorthand("claude-3-haiku-20240307", "Hi"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut emitted = String::new();
    while let Some(fragment) = stream.next().await {
        emitted.push_str(fragment.unwrap().as_text().unwrap());
    }

    let response = stream.response();
    assert_eq!(emitted, "Hello from Bedrock");
    assert_eq!(response.text(), emitted);
    assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
    assert_eq!(response.usage.output_tokens, Some(5));

    let (model_id, body) = script.last_invocation();
    assert_eq!(model_id, "anthropic.claude-3-haiku-20240307-v1:0");
    assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
    assert!(body.get("model").is_none());
    assert!(body.get("stream").is_none());
    assert_eq!(body["messages"][0]["content"], "Hi");
}

#[tokio::test]
async fn completion_stream_assembles_over_bedrock() {
    let (client, script) = client(BedrockScript {
        parts: vec![
            json!({"completion":" Hello","stop_reason":null,"stop":null}),
            json!({"completion":" there","stop_reason":null,"stop":null}),
            json!({"completion":"","stop_reason":"stop_sequence","stop":"\n\nHuman:","amazon-bedrock-invocationMetrics":{"inputTokenCount":12,"outputTokenCount":4}}),
        ],
        ..BedrockScript::default()
    });

    let response = client
        .complete_streamed(
            &CompletionRequest::question("claude-2.1", "Greet me"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.completion, " Hello there");
    assert_eq!(response.stop_reason, Some(StopReason::StopSequence));
    assert_eq!(response.stop.as_deref(), Some("\n\nHuman:"));

    let (model_id, body) = script.last_invocation();
    assert_eq!(model_id, "anthropic.claude-v2:1");
    assert!(body.get("anthropic_version").is_none());
    assert!(body["prompt"].as_str().unwrap().ends_with("\n\nAssistant:"));
}

#[tokio::test]
async fn blocking_message_decodes_invoke_model_body() {
    let (client, script) = client(BedrockScript {
        body: json!({
            "id": "msg_bdrk_02",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-haiku-20241022",
            "content": [{"type": "text", "text": "Hi there"}],
            "stop_reason": "end_turn",
            "stop_sequence": null,
            "usage": {"input_tokens": 8, "output_tokens": 3}
        }),
        ..BedrockScript::default()
    });

    let response = client
        .send_shorthand(&MessageRequest::shorthand("claude-3-5-haiku-20241022", "Hi"))
        .await
        .unwrap();

    assert_eq!(response.text(), "Hi there");
    assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
    assert_eq!(
        script.last_invocation().0,
        "anthropic.claude-3-5-haiku-20241022-v1:0"
    );
}

#[tokio::test]
async fn stream_error_after_partial_output_keeps_the_partial_response() {
    let mut parts = message_parts();
    parts.truncate(3);
    let (client, _) = client(BedrockScript {
        parts,
        failure: Some(("ModelStreamErrorException", "upstream model failed")),
        ..BedrockScript::default()
    });

    let mut stream = client
        .stream_shorthand(
            &MessageRequest::shorthand("claude-3-haiku-20240307", "Hi"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap().as_text(), Some("Hello"));
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.api_error().unwrap().code, Some(424));
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    assert!(stream.next().await.is_none());
    assert_eq!(stream.response().text(), "Hello");
}

#[tokio::test]
async fn unknown_endpoint_is_refused_before_invoking() {
    let script = BedrockScript::default();
    let err = script
        .send(&Endpoint::new("v1/messages/count_tokens"), json!({"model": "m"}))
        .await
        .unwrap_err();

    assert!(matches!(err, AnthropicRequestError::Bedrock { retryable: false, .. }));
    assert!(script.invocations.lock().unwrap().is_empty());
}
