#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use claude_stream_ox::{
    Anthropic, AnthropicRequestError, Endpoint, Transport, stream::ByteStream,
};
use futures_util::{StreamExt, stream};
use serde_json::Value;

/// A transport that replays canned bytes and records what it was sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    chunks: Vec<Vec<u8>>,
    body: Vec<u8>,
    /// Keep the stream open after the last chunk instead of closing it.
    hang: bool,
    pub requests: Mutex<Vec<(Endpoint, Value)>>,
}

impl ScriptedTransport {
    pub fn streaming<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            ..Self::default()
        }
    }

    pub fn blocking(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn last_request(&self) -> Option<(Endpoint, Value)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, endpoint: &Endpoint, body: Value) -> Result<Bytes, AnthropicRequestError> {
        self.requests.lock().unwrap().push((endpoint.clone(), body));
        Ok(Bytes::from(self.body.clone()))
    }

    async fn send_stream(
        &self,
        endpoint: &Endpoint,
        body: Value,
    ) -> Result<ByteStream, AnthropicRequestError> {
        self.requests.lock().unwrap().push((endpoint.clone(), body));
        let chunks = stream::iter(
            self.chunks
                .clone()
                .into_iter()
                .map(|chunk| Ok(Bytes::from(chunk))),
        );
        if self.hang {
            Ok(chunks.chain(stream::pending()).boxed())
        } else {
            Ok(chunks.boxed())
        }
    }
}

pub fn client(transport: ScriptedTransport) -> (Anthropic, Arc<ScriptedTransport>) {
    let transport = Arc::new(transport);
    let client = Anthropic::new("test-key").with_transport(transport.clone());
    (client, transport)
}

pub fn sse(event: &str, data: &str) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

/// A complete message stream whose text blocks are "Hello, world" and "!".
pub fn message_stream() -> String {
    [
        sse(
            "message_start",
            r#"{"type":"message_start","message":{"id":"msg_01","type":"message","role":"assistant","content":[],"model":"claude-3-5-sonnet-20241022","stop_reason":null,"stop_sequence":null,"usage":{"input_tokens":12,"output_tokens":1}}}"#,
        ),
        sse(
            "content_block_start",
            r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#,
        ),
        sse("ping", r#"{"type": "ping"}"#),
        sse(
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#,
        ),
        sse(
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":", world"}}"#,
        ),
        sse("content_block_stop", r#"{"type":"content_block_stop","index":0}"#),
        sse(
            "content_block_start",
            r#"{"type":"content_block_start","index":1,"content_block":{"type":"text","text":"!"}}"#,
        ),
        sse("content_block_stop", r#"{"type":"content_block_stop","index":1}"#),
        sse(
            "message_delta",
            r#"{"type":"message_delta","delta":{"stop_reason":"end_turn","stop_sequence":null},"usage":{"output_tokens":6}}"#,
        ),
        sse("message_stop", r#"{"type":"message_stop"}"#),
    ]
    .concat()
}

pub fn completion_stream() -> String {
    [
        sse(
            "completion",
            r#"{"completion":"Hello","stop_reason":null,"model":"claude-2.1"}"#,
        ),
        sse("ping", "{}"),
        sse(
            "completion",
            r#"{"completion":" world","stop_reason":null,"model":"claude-2.1"}"#,
        ),
        sse(
            "completion",
            r#"{"completion":"","stop_reason":"stop_sequence","stop":"\n\nHuman:","model":"claude-2.1"}"#,
        ),
    ]
    .concat()
}
