use std::{collections::HashMap, fmt, sync::Arc};

use bon::Builder;
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    assembler::MessageState,
    completion::{CompletionRequest, CompletionResponse, CompletionState},
    error::AnthropicRequestError,
    internal::{Endpoint, HttpTransport, Transport, with_stream_flag},
    message::{Message, ShortHandMessage},
    request::MessageRequest,
    response::MessageResponse,
    stream::{StreamHandle, StreamMachine},
};

const BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// A streaming completion call.
pub type CompletionStream = StreamHandle<CompletionState>;
/// A streaming messages call.
pub type MessageStream = StreamHandle<MessageState>;

/// A struct to configure beta features for the Anthropic API.
#[derive(Clone, Default, Debug)]
pub struct BetaFeatures {
    /// Enables fine-grained tool streaming.
    pub fine_grained_tool_streaming: bool,
    /// Enables the computer use tool.
    pub computer_use: bool,
    /// Any other `anthropic-beta` flags, sent as given.
    pub other: Vec<String>,
}

impl BetaFeatures {
    /// The `anthropic-beta` header value, if any feature is enabled.
    pub fn header_value(&self) -> Option<String> {
        let mut flags = Vec::new();
        if self.fine_grained_tool_streaming {
            flags.push("fine-grained-tool-streaming-2025-05-14".to_string());
        }
        if self.computer_use {
            flags.push("computer-use-2025-01-24".to_string());
        }
        flags.extend(self.other.iter().cloned());
        (!flags.is_empty()).then(|| flags.join(","))
    }
}

#[derive(Clone, Builder)]
pub struct Anthropic {
    #[builder(into)]
    pub(crate) api_key: String,
    #[builder(default)]
    pub(crate) client: reqwest::Client,
    #[builder(default = BASE_URL.to_string(), into)]
    pub(crate) base_url: String,
    #[builder(default = API_VERSION.to_string(), into)]
    pub(crate) api_version: String,
    #[builder(default)]
    pub(crate) headers: HashMap<String, String>,
    /// Log request content at `debug` level.
    #[builder(default)]
    pub(crate) debug: bool,
    /// Replaces the HTTP transport built from the fields above.
    pub(crate) transport: Option<Arc<dyn Transport>>,
}

impl Anthropic {
    /// Create a new Anthropic client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder().api_key(api_key).build()
    }

    pub fn load_from_env() -> Result<Self, std::env::VarError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")?;
        Ok(Anthropic::builder().api_key(api_key).build())
    }

    /// Pin a different `anthropic-version`.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Add a custom header to the client
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Enables beta features for the client.
    #[must_use]
    pub fn with_beta_features(mut self, features: &BetaFeatures) -> Self {
        if let Some(value) = features.header_value() {
            self.headers.insert("anthropic-beta".to_string(), value);
        }
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn transport(&self) -> Arc<dyn Transport> {
        match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(HttpTransport::new(
                self.client.clone(),
                &self.base_url,
                &self.api_key,
                &self.api_version,
                self.headers.clone(),
            )),
        }
    }

    async fn request<B, T>(&self, endpoint: Endpoint, body: &B) -> Result<T, AnthropicRequestError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = with_stream_flag(serde_json::to_value(body)?, false);
        let bytes = self.transport().send(&endpoint, body).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn open_stream<M, B>(
        &self,
        endpoint: Endpoint,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<StreamHandle<M>, AnthropicRequestError>
    where
        M: StreamMachine,
        B: Serialize + Sync,
    {
        let body = with_stream_flag(serde_json::to_value(body)?, true);
        let transport = self.transport();
        let bytes = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AnthropicRequestError::Cancelled),
            bytes = transport.send_stream(&endpoint, body) => bytes?,
        };
        Ok(StreamHandle::spawn(bytes, cancel))
    }

    fn log_completion(&self, request: &CompletionRequest) {
        if self.debug {
            debug!(model = %request.model, prompt = %request.prompt, "completion request");
        }
    }

    fn log_messages<M: fmt::Display>(&self, request: &MessageRequest<M>) {
        if !self.debug {
            return;
        }
        if let Some(system) = &request.system {
            debug!(model = %request.model, system = %system, "message request");
        }
        for (index, message) in request.messages.iter().enumerate() {
            debug!(model = %request.model, index, message = %message, "message request");
        }
    }
}

/// Completion endpoint.
impl Anthropic {
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, AnthropicRequestError> {
        self.log_completion(request);
        self.request(Endpoint::complete(), request).await
    }

    /// Stream a completion. Each fragment is the delta record of one
    /// `completion` event.
    pub async fn stream_complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<CompletionStream, AnthropicRequestError> {
        self.log_completion(request);
        self.open_stream(Endpoint::complete(), request, cancel).await
    }

    /// Stream a completion and return only the assembled response.
    pub async fn complete_streamed(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<CompletionResponse, AnthropicRequestError> {
        self.stream_complete(request, cancel).await?.finish().await
    }
}

/// Messages endpoint.
impl Anthropic {
    pub async fn send<M>(
        &self,
        request: &MessageRequest<M>,
    ) -> Result<MessageResponse, AnthropicRequestError>
    where
        M: Serialize + fmt::Display + Sync,
    {
        self.log_messages(request);
        self.request(Endpoint::messages(), request).await
    }

    pub async fn stream<M>(
        &self,
        request: &MessageRequest<M>,
        cancel: &CancellationToken,
    ) -> Result<MessageStream, AnthropicRequestError>
    where
        M: Serialize + fmt::Display + Sync,
    {
        self.log_messages(request);
        self.open_stream(Endpoint::messages(), request, cancel).await
    }

    /// Stream a message and return only the assembled response.
    pub async fn send_streamed<M>(
        &self,
        request: &MessageRequest<M>,
        cancel: &CancellationToken,
    ) -> Result<MessageResponse, AnthropicRequestError>
    where
        M: Serialize + fmt::Display + Sync,
    {
        self.stream(request, cancel).await?.finish().await
    }

    pub async fn send_message(
        &self,
        request: &MessageRequest<Message>,
    ) -> Result<MessageResponse, AnthropicRequestError> {
        self.send(request).await
    }

    pub async fn stream_message(
        &self,
        request: &MessageRequest<Message>,
        cancel: &CancellationToken,
    ) -> Result<MessageStream, AnthropicRequestError> {
        self.stream(request, cancel).await
    }

    pub async fn send_message_streamed(
        &self,
        request: &MessageRequest<Message>,
        cancel: &CancellationToken,
    ) -> Result<MessageResponse, AnthropicRequestError> {
        self.send_streamed(request, cancel).await
    }

    pub async fn send_shorthand(
        &self,
        request: &MessageRequest<ShortHandMessage>,
    ) -> Result<MessageResponse, AnthropicRequestError> {
        self.send(request).await
    }

    pub async fn stream_shorthand(
        &self,
        request: &MessageRequest<ShortHandMessage>,
        cancel: &CancellationToken,
    ) -> Result<MessageStream, AnthropicRequestError> {
        self.stream(request, cancel).await
    }

    pub async fn send_shorthand_streamed(
        &self,
        request: &MessageRequest<ShortHandMessage>,
        cancel: &CancellationToken,
    ) -> Result<MessageResponse, AnthropicRequestError> {
        self.send_streamed(request, cancel).await
    }
}

impl fmt::Debug for Anthropic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anthropic")
            .field("api_key", &"[REDACTED]")
            .field("client", &self.client)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beta_features_join_into_one_header() {
        let features = BetaFeatures {
            fine_grained_tool_streaming: true,
            other: vec!["token-efficient-tools-2025-02-19".to_string()],
            ..BetaFeatures::default()
        };
        let client = Anthropic::new("key").with_beta_features(&features);

        assert_eq!(
            client.headers.get("anthropic-beta").map(String::as_str),
            Some("fine-grained-tool-streaming-2025-05-14,token-efficient-tools-2025-02-19")
        );
        assert_eq!(BetaFeatures::default().header_value(), None);
    }

    #[test]
    fn builder_defaults() {
        let client = Anthropic::builder().api_key("key").build();
        assert_eq!(client.base_url, BASE_URL);
        assert_eq!(client.api_version(), "2023-06-01");
        assert!(!client.debug);

        let client = client.with_version("2024-01-01").header("x-trace", "1");
        assert_eq!(client.api_version(), "2024-01-01");
        assert_eq!(client.headers["x-trace"], "1");
    }

    #[test]
    fn debug_output_redacts_key() {
        let client = Anthropic::new("sk-secret");
        assert!(!format!("{client:?}").contains("sk-secret"));
    }
}
