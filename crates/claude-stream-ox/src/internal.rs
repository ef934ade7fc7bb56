use std::{collections::HashMap, fmt};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::{
    RequestBuilder as ReqwestRequestBuilder,
    header::{ACCEPT, CACHE_CONTROL, CONNECTION, CONTENT_TYPE, HeaderName, HeaderValue},
};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{self, AnthropicRequestError},
    stream::ByteStream,
};

pub(crate) const COMPLETE_URL: &str = "v1/complete";
pub(crate) const CHAT_URL: &str = "v1/messages";

/// A POST endpoint relative to the client's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn complete() -> Self {
        Self::new(COMPLETE_URL)
    }

    pub fn messages() -> Self {
        Self::new(CHAT_URL)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Moves request bodies to the API and response bytes back.
///
/// `send` returns the whole body of a successful response; `send_stream`
/// returns the body as it arrives. Both map non-2xx responses to
/// [`AnthropicRequestError::Api`] (or `UnexpectedResponse`). The body's
/// `stream` flag is already set to match the call.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, endpoint: &Endpoint, body: Value) -> Result<Bytes, AnthropicRequestError>;

    async fn send_stream(
        &self,
        endpoint: &Endpoint,
        body: Value,
    ) -> Result<ByteStream, AnthropicRequestError>;
}

/// Set or clear the `stream` flag of a JSON request body.
pub(crate) fn with_stream_flag(mut body: Value, stream: bool) -> Value {
    if let Some(object) = body.as_object_mut() {
        if stream {
            object.insert("stream".to_string(), Value::Bool(true));
        } else {
            object.remove("stream");
        }
    }
    body
}

/// The reqwest-backed transport used by [`Anthropic`](crate::Anthropic).
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_version: String,
    headers: HashMap<String, String>,
}

impl HttpTransport {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            headers,
        }
    }

    fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint.path)
    }

    /// Build a request for the given endpoint
    fn build_request(
        &self,
        endpoint: &Endpoint,
        streaming: bool,
    ) -> Result<ReqwestRequestBuilder, AnthropicRequestError> {
        if self.api_key.is_empty() {
            return Err(AnthropicRequestError::AuthenticationMissing);
        }

        let mut req = self
            .client
            .post(self.url(endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .header(CONTENT_TYPE, "application/json");

        if streaming {
            req = req
                .header(ACCEPT, "text/event-stream")
                .header(CONNECTION, "keep-alive")
                .header(CACHE_CONTROL, "no-cache");
        }

        // Add custom headers
        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| AnthropicRequestError::InvalidHeader(format!("{key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AnthropicRequestError::InvalidHeader(format!("{key}: {e}")))?;
            req = req.header(name, value);
        }

        Ok(req)
    }

    async fn execute(
        &self,
        endpoint: &Endpoint,
        body: &Value,
        streaming: bool,
    ) -> Result<reqwest::Response, AnthropicRequestError> {
        debug!(endpoint = %endpoint, streaming, "sending request");
        let res = self
            .build_request(endpoint, streaming)?
            .json(body)
            .send()
            .await?;

        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status();
            let bytes = res.bytes().await?;
            debug!(endpoint = %endpoint, status = status.as_u16(), "request rejected");
            Err(error::parse_error_response(status, &bytes))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: &Endpoint, body: Value) -> Result<Bytes, AnthropicRequestError> {
        let res = self.execute(endpoint, &body, false).await?;
        Ok(res.bytes().await?)
    }

    async fn send_stream(
        &self,
        endpoint: &Endpoint,
        body: Value,
    ) -> Result<ByteStream, AnthropicRequestError> {
        let res = self.execute(endpoint, &body, true).await?;
        Ok(res
            .bytes_stream()
            .map(|chunk| chunk.map_err(AnthropicRequestError::from))
            .boxed())
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
