#[allow(clippy::module_inception)]
pub mod message;

pub use crate::tool::{ToolResult, ToolUse};
pub use message::{
    Content, Image, ImageSource, Message, RedactedThinking, Role, ShortHandMessage, Text,
    ThinkingContent,
};
