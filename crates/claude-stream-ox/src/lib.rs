#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

pub mod assembler;
pub mod bedrock;
pub mod client;
pub mod completion;
pub mod error;
pub mod internal;
pub mod message;
pub mod model;
pub mod prelude;
pub mod prompt;
pub mod request;
pub mod response;
pub mod sse;
pub mod stream;
pub mod tool;
pub mod usage;

// Re-export main types
pub use assembler::{Fragment, MessageState};
#[cfg(feature = "bedrock")]
pub use bedrock::BedrockTransport;
pub use client::{Anthropic, BetaFeatures, CompletionStream, MessageStream};
pub use completion::{CompletionRequest, CompletionResponse, CompletionState};
pub use error::{AnthropicRequestError, ApiError, ErrorKind};
pub use internal::{Endpoint, HttpTransport, Transport};
pub use model::Model;
pub use prompt::Prompt;
pub use request::{MessageRequest, ShortHandMessageRequest};
pub use response::{MessageResponse, StopReason};
pub use stream::{StreamHandle, StreamMachine};
pub use tokio_util::sync::CancellationToken;
