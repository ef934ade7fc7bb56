use std::{fmt, sync::Arc};

use async_stream::try_stream;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, meta::region::RegionProviderChain};
use aws_sdk_bedrockruntime::{
    Client as BedrockRuntimeClient,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::ResponseStream,
};
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::Value;
use tracing::debug;

use super::{api_error, frame_chunk, prepare};
use crate::{
    client::Anthropic,
    error::AnthropicRequestError,
    internal::{Endpoint, Transport},
    stream::ByteStream,
};

/// Sends requests through Bedrock's `InvokeModel` operations.
///
/// Streamed chunks are re-framed as server-sent events, so the usual
/// completion and message streams work on top of it.
#[derive(Debug, Clone)]
pub struct BedrockTransport {
    client: BedrockRuntimeClient,
}

impl BedrockTransport {
    pub fn new(client: BedrockRuntimeClient) -> Self {
        Self { client }
    }

    /// Build a client from the environment's AWS configuration, falling back
    /// to `us-east-1` when no region is configured.
    pub async fn from_env() -> Self {
        let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;
        Self::new(BedrockRuntimeClient::new(&config))
    }
}

impl Anthropic {
    /// A client that talks to Claude on Bedrock instead of the Anthropic API.
    pub fn bedrock(client: BedrockRuntimeClient) -> Self {
        Self::new(String::new()).with_transport(Arc::new(BedrockTransport::new(client)))
    }
}

fn sdk_error<E, R>(error: SdkError<E, R>) -> AnthropicRequestError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    if let Some(service) = error.as_service_error() {
        return api_error(service.code(), service.message());
    }
    let retryable = matches!(
        error,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_)
    );
    AnthropicRequestError::Bedrock {
        message: DisplayErrorContext(&error).to_string(),
        retryable,
    }
}

#[async_trait]
impl Transport for BedrockTransport {
    async fn send(&self, endpoint: &Endpoint, body: Value) -> Result<Bytes, AnthropicRequestError> {
        let request = prepare(endpoint, body)?;
        debug!(endpoint = %endpoint, model_id = %request.model_id, "invoking Bedrock model");

        let output = self
            .client
            .invoke_model()
            .model_id(request.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(aws_smithy_types::Blob::new(request.body))
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(Bytes::from(output.body.into_inner()))
    }

    async fn send_stream(
        &self,
        endpoint: &Endpoint,
        body: Value,
    ) -> Result<ByteStream, AnthropicRequestError> {
        let request = prepare(endpoint, body)?;
        debug!(
            endpoint = %endpoint,
            model_id = %request.model_id,
            "invoking Bedrock model with response stream"
        );

        let output = self
            .client
            .invoke_model_with_response_stream()
            .model_id(request.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(aws_smithy_types::Blob::new(request.body))
            .send()
            .await
            .map_err(sdk_error)?;

        let endpoint = endpoint.clone();
        let mut response_stream = output.body;
        let stream = try_stream! {
            while let Some(event) = response_stream.recv().await.map_err(sdk_error)? {
                match event {
                    ResponseStream::Chunk(part) => {
                        if let Some(bytes) = part.bytes {
                            yield frame_chunk(&endpoint, bytes.as_ref())?;
                        }
                    }
                    other => debug!(event = ?other, "skipping unknown Bedrock stream event"),
                }
            }
        };

        Ok(stream.boxed())
    }
}
