//! Claude on Amazon Bedrock.
//!
//! Bedrock takes the same request bodies as the Anthropic API, minus the
//! `model` and `stream` fields, and returns the same event payloads as
//! event-stream chunks. [`prepare`] adapts a request body and [`frame_chunk`]
//! turns each chunk back into the event text the stream interpreters read,
//! so both event families run unchanged over Bedrock.
//!
//! The SDK-backed transport needs the `bedrock` feature.

use bytes::Bytes;
use serde_json::Value;

use crate::{
    error::{AnthropicRequestError, ApiError},
    internal::{CHAT_URL, COMPLETE_URL, Endpoint},
    model::Model,
};

#[cfg(feature = "bedrock")]
mod transport;

#[cfg(feature = "bedrock")]
pub use transport::BedrockTransport;

/// The `anthropic_version` Bedrock expects in messages bodies.
pub const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Completion,
    Messages,
}

fn family(endpoint: &Endpoint) -> Result<Family, AnthropicRequestError> {
    match endpoint.path.as_str() {
        COMPLETE_URL => Ok(Family::Completion),
        CHAT_URL => Ok(Family::Messages),
        other => Err(AnthropicRequestError::Bedrock {
            message: format!("no Bedrock operation for `{other}`"),
            retryable: false,
        }),
    }
}

/// The Bedrock model ID for a model name. Names without a mapping, such as
/// raw Bedrock IDs or inference profile ARNs, pass through unchanged.
pub fn model_id(name: &str) -> String {
    name.parse::<Model>()
        .ok()
        .and_then(Model::bedrock_id)
        .map_or_else(|| name.to_string(), str::to_string)
}

/// A request body ready for `InvokeModel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    pub model_id: String,
    pub body: Vec<u8>,
}

/// Move the model out of the body and into the model ID, and drop the
/// `stream` flag, which Bedrock expresses as a separate operation.
pub fn prepare(endpoint: &Endpoint, body: Value) -> Result<InvokeRequest, AnthropicRequestError> {
    let family = family(endpoint)?;
    let Value::Object(mut body) = body else {
        return Err(AnthropicRequestError::Bedrock {
            message: "request body is not a JSON object".to_string(),
            retryable: false,
        });
    };

    let model = match body.remove("model") {
        Some(Value::String(model)) if !model.is_empty() => model,
        _ => {
            return Err(AnthropicRequestError::Bedrock {
                message: "request names no model".to_string(),
                retryable: false,
            });
        }
    };
    body.remove("stream");
    if family == Family::Messages {
        body.insert(
            "anthropic_version".to_string(),
            Value::String(BEDROCK_ANTHROPIC_VERSION.to_string()),
        );
    }

    Ok(InvokeRequest {
        model_id: model_id(&model),
        body: serde_json::to_vec(&body)?,
    })
}

/// Frame one response-stream chunk as a server-sent event.
///
/// Messages chunks are named by their `type`. Completion chunks carry no
/// type and are named `completion`.
pub fn frame_chunk(endpoint: &Endpoint, payload: &[u8]) -> Result<Bytes, AnthropicRequestError> {
    let family = family(endpoint)?;
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| AnthropicRequestError::bad_event(format!("Bedrock chunk is not JSON: {e}")))?;

    let event = match (value.get("type").and_then(Value::as_str), family) {
        (Some(event), _) => event.to_string(),
        (None, Family::Completion) => "completion".to_string(),
        (None, Family::Messages) => {
            return Err(AnthropicRequestError::bad_event(
                "Bedrock chunk carries no event type",
            ));
        }
    };

    let data = serde_json::to_string(&value)?;
    Ok(Bytes::from(format!("event: {event}\ndata: {data}\n\n")))
}

/// Classify a Bedrock service error by its error code, using the HTTP
/// status Bedrock documents for it.
pub fn api_error(code: Option<&str>, message: Option<&str>) -> AnthropicRequestError {
    let code = code.unwrap_or("UnknownError");
    let (r#type, status) = match code {
        "ThrottlingException" | "ModelNotReadyException" => ("rate_limit_error", Some(429)),
        "ServiceUnavailableException" => ("overloaded_error", Some(503)),
        "InternalServerException" => ("api_error", Some(500)),
        "ModelTimeoutException" => ("api_error", Some(408)),
        "ModelErrorException" | "ModelStreamErrorException" => ("api_error", Some(424)),
        "ValidationException" | "ServiceQuotaExceededException" => {
            ("invalid_request_error", Some(400))
        }
        "AccessDeniedException" => ("permission_error", Some(403)),
        "ResourceNotFoundException" => ("not_found_error", Some(404)),
        _ => ("api_error", None),
    };

    let error = ApiError::new(r#type, format!("{code}: {}", message.unwrap_or_default()));
    AnthropicRequestError::Api(match status {
        Some(status) => error.with_code(status),
        None => error,
    })
}
