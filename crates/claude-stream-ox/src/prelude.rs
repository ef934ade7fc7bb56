//! Common imports for working with the Anthropic API.
//!
//! ```rust,no_run
//! use claude_stream_ox::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Anthropic::new("your-api-key");
//! let request = MessageRequest::user(Model::Claude35Haiku20241022, "Hello!");
//!
//! let mut stream = client.stream_message(&request, &CancellationToken::new()).await?;
//! while let Some(fragment) = stream.next().await {
//!     if let Some(text) = fragment?.as_text() {
//!         print!("{text}");
//!     }
//! }
//! println!("\n{}", stream.response().text());
//! # Ok(())
//! # }
//! ```

pub use crate::{
    Anthropic, AnthropicRequestError, BetaFeatures, CancellationToken, CompletionRequest,
    CompletionResponse, Fragment, MessageRequest, MessageResponse, Model, Prompt,
    ShortHandMessageRequest, StopReason,
    message::{Content, Image, ImageSource, Message, Role, ShortHandMessage, Text},
    prompt::{PromptMessage, Speaker},
    tool::{Tool, ToolChoice, ToolResult, ToolResultContent, ToolUse},
    usage::Usage,
};
