use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categorizes errors for retry logic and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rate limiting - should retry with backoff
    RateLimit,
    /// Authentication/authorization issues - should not retry
    Auth,
    /// Invalid request format - should not retry
    InvalidRequest,
    /// Server overloaded - may retry
    ServerOverloaded,
    /// Network/connection issues - may retry
    Network,
    /// API temporarily unavailable - may retry
    ServiceUnavailable,
    /// The event stream did not match the expected framing or event order
    Framing,
    /// A recognised payload could not be decoded
    Decode,
    /// The caller gave up on the request
    Cancelled,
    /// Unknown/other errors
    Other,
}

/// A structured error reported by the API.
///
/// Arrives either as the body of a non-2xx response or as the payload of an
/// `error` stream event. `code` carries the HTTP status when the error came
/// from the transport layer; stream-level errors have no status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub r#type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl ApiError {
    pub fn new(r#type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            r#type: r#type.into(),
            message: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Advisory only: nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        let by_status = self
            .code
            .is_some_and(|code| code >= 500 || code == 429 || code == 408);
        let by_type = matches!(
            self.r#type.as_str(),
            "rate_limit_error" | "overloaded_error"
        );
        by_status || by_type
    }

    pub fn kind(&self) -> ErrorKind {
        match self.r#type.as_str() {
            "rate_limit_error" => ErrorKind::RateLimit,
            "overloaded_error" => ErrorKind::ServerOverloaded,
            "authentication_error" | "permission_error" => ErrorKind::Auth,
            "invalid_request_error" | "not_found_error" | "request_too_large" => {
                ErrorKind::InvalidRequest
            }
            "api_error" => ErrorKind::ServiceUnavailable,
            _ => match self.code {
                Some(429) => ErrorKind::RateLimit,
                Some(code) if code >= 500 => ErrorKind::ServiceUnavailable,
                _ => ErrorKind::Other,
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.r#type, self.message)?;
        if let Some(code) = self.code {
            write!(f, " (HTTP {code})")?;
        }
        Ok(())
    }
}

/// Envelope shared by error bodies and `error` events: `{"error": {...}}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Error)]
pub enum AnthropicRequestError {
    /// Errors from the HTTP client
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors outside of a stream
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    /// Structured error from the API
    #[error("API error: {0}")]
    Api(ApiError),

    /// Non-2xx response whose body is not a structured API error
    #[error("Unexpected response from API (HTTP {status}): {body}")]
    UnexpectedResponse { status: u16, body: String },

    /// Event text did not match the expected framing, or arrived out of order
    #[error("Bad event: {0}")]
    BadEvent(String),

    /// A recognised event carried a payload of the wrong shape
    #[error("Failed to decode `{event}` event: {source}")]
    Deserialization {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    /// An `error` event whose payload could not be decoded
    #[error("Stream error: {0}")]
    RawError(String),

    /// The connection closed before the stream reached a terminal event
    #[error("Stream closed before a terminal event")]
    IncompleteStream,

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// No API key configured
    #[error("Authentication missing: no API key provided")]
    AuthenticationMissing,

    /// A configured header name or value is not valid HTTP
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A Bedrock call failed before the model produced a service error
    #[error("Bedrock error: {message}")]
    Bedrock { message: String, retryable: bool },
}

impl AnthropicRequestError {
    /// Returns the error kind for categorizing errors in retry logic
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(error) => error.kind(),
            Self::UnexpectedResponse { status, .. } => match status {
                429 => ErrorKind::RateLimit,
                401 | 403 => ErrorKind::Auth,
                400 | 404 | 413 | 422 => ErrorKind::InvalidRequest,
                529 => ErrorKind::ServerOverloaded,
                s if *s >= 500 => ErrorKind::ServiceUnavailable,
                _ => ErrorKind::Other,
            },
            Self::Http(e) => {
                if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
                    ErrorKind::Network
                } else {
                    ErrorKind::Other
                }
            }
            Self::IncompleteStream => ErrorKind::Network,
            Self::BadEvent(_) => ErrorKind::Framing,
            Self::Deserialization { .. } | Self::RawError(_) | Self::Serde(_) => ErrorKind::Decode,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::AuthenticationMissing => ErrorKind::Auth,
            Self::InvalidHeader(_) => ErrorKind::InvalidRequest,
            Self::Bedrock {
                retryable: true, ..
            } => ErrorKind::Network,
            Self::Bedrock { .. } => ErrorKind::Other,
        }
    }

    /// Returns true if this error should be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(error) => error.is_retryable(),
            Self::UnexpectedResponse { status, .. } => *status >= 500 || *status == 429,
            _ => matches!(
                self.kind(),
                ErrorKind::RateLimit
                    | ErrorKind::ServerOverloaded
                    | ErrorKind::Network
                    | ErrorKind::ServiceUnavailable
            ),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The structured API error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) => Some(error),
            _ => None,
        }
    }

    pub(crate) fn bad_event(detail: impl Into<String>) -> Self {
        Self::BadEvent(detail.into())
    }
}

impl From<ApiError> for AnthropicRequestError {
    fn from(error: ApiError) -> Self {
        Self::Api(error)
    }
}

/// Parse the body of a non-2xx response, merging the HTTP status into the
/// structured error when the body has one.
pub fn parse_error_response(status: reqwest::StatusCode, bytes: &[u8]) -> AnthropicRequestError {
    match serde_json::from_slice::<ApiErrorResponse>(bytes) {
        Ok(payload) => AnthropicRequestError::Api(payload.error.with_code(status.as_u16())),
        Err(_) => AnthropicRequestError::UnexpectedResponse {
            status: status.as_u16(),
            body: String::from_utf8_lossy(bytes).into_owned(),
        },
    }
}

/// Parse the payload of an `error` stream event. Undecodable payloads are
/// surfaced verbatim.
pub fn parse_error_event(payload: &str) -> AnthropicRequestError {
    match serde_json::from_str::<ApiErrorResponse>(payload) {
        Ok(payload) => AnthropicRequestError::Api(payload.error),
        Err(_) => AnthropicRequestError::RawError(payload.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn overloaded_status_529_is_retryable() {
        let body = br#"{"error":{"type":"overloaded_error","message":"x"}}"#;
        let err = parse_error_response(StatusCode::from_u16(529).unwrap(), body);

        let api = err.api_error().expect("structured error");
        assert_eq!(api.r#type, "overloaded_error");
        assert_eq!(api.message, "x");
        assert_eq!(api.code, Some(529));
        assert!(err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::ServerOverloaded);
    }

    #[test]
    fn invalid_request_400_is_not_retryable() {
        let body = br#"{"type":"error","error":{"type":"invalid_request_error","message":"bad"}}"#;
        let err = parse_error_response(StatusCode::BAD_REQUEST, body);

        assert!(!err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn too_many_requests_is_retryable_whatever_the_type() {
        let body = br#"{"error":{"type":"something_new","message":"slow down"}}"#;
        let err = parse_error_response(StatusCode::TOO_MANY_REQUESTS, body);
        assert!(err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::RateLimit);
    }

    #[test]
    fn rate_limit_type_is_retryable_without_status() {
        let err = parse_error_event(r#"{"type":"error","error":{"type":"rate_limit_error","message":"m"}}"#);
        assert!(err.is_retryable());
    }

    #[test]
    fn plain_text_body_keeps_status_and_text() {
        let err = parse_error_response(StatusCode::BAD_GATEWAY, b"upstream went away");
        match &err {
            AnthropicRequestError::UnexpectedResponse { status, body } => {
                assert_eq!(*status, 502);
                assert_eq!(body, "upstream went away");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[test]
    fn undecodable_error_event_surfaces_raw_payload() {
        let err = parse_error_event("{not json");
        match err {
            AnthropicRequestError::RawError(raw) => assert_eq!(raw, "{not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn framing_and_cancellation_are_not_retryable() {
        assert!(!AnthropicRequestError::bad_event("x").is_retryable());
        assert!(!AnthropicRequestError::Cancelled.is_retryable());
        assert!(AnthropicRequestError::Cancelled.is_cancelled());
        assert_eq!(AnthropicRequestError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn api_error_display_includes_status() {
        let error = ApiError::new("api_error", "boom").with_code(500);
        assert_eq!(error.to_string(), "api_error: boom (HTTP 500)");
    }

    #[test]
    fn request_timeout_408_is_retryable() {
        assert!(ApiError::new("api_error", "slow").with_code(408).is_retryable());
        assert!(!ApiError::new("permission_error", "no").with_code(403).is_retryable());
    }

    #[test]
    fn bedrock_failures_follow_their_retry_flag() {
        let dispatch = AnthropicRequestError::Bedrock {
            message: "dispatch failure".to_string(),
            retryable: true,
        };
        assert_eq!(dispatch.kind(), ErrorKind::Network);
        assert!(dispatch.is_retryable());

        let construction = AnthropicRequestError::Bedrock {
            message: "failed to construct request".to_string(),
            retryable: false,
        };
        assert_eq!(construction.kind(), ErrorKind::Other);
        assert!(!construction.is_retryable());
        assert_eq!(
            construction.to_string(),
            "Bedrock error: failed to construct request"
        );
    }
}
