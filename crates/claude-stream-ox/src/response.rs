use serde::{Deserialize, Serialize};

use crate::{
    message::{Content, Role},
    tool::ToolUse,
    usage::Usage,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    #[serde(other)]
    Unknown,
}

fn message_type() -> String {
    "message".to_string()
}

fn assistant() -> Role {
    Role::Assistant
}

/// A messages-endpoint response.
///
/// While streaming this is the accumulator: blocks grow as deltas arrive and
/// `stop_reason` stays `None` until the `message_delta` that ends the turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default = "message_type")]
    pub r#type: String,
    #[serde(default = "assistant")]
    pub role: Role,
    #[serde(default)]
    pub content: Vec<Content>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

impl Default for MessageResponse {
    fn default() -> Self {
        Self {
            id: String::new(),
            r#type: message_type(),
            role: Role::Assistant,
            content: Vec::new(),
            model: String::new(),
            stop_reason: None,
            stop_sequence: None,
            usage: Usage::default(),
        }
    }
}

impl MessageResponse {
    pub fn text_content(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|content| content.as_text().map(|text| text.as_str()))
            .collect()
    }

    /// All text blocks joined in block order.
    pub fn text(&self) -> String {
        self.text_content().concat()
    }

    pub fn thinking_content(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|content| content.as_thinking().map(|thinking| thinking.text.as_str()))
            .collect()
    }

    pub fn has_thinking(&self) -> bool {
        self.content
            .iter()
            .any(|content| matches!(content, Content::Thinking(_) | Content::RedactedThinking(_)))
    }

    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUse> {
        self.content.iter().filter_map(Content::as_tool_use)
    }

    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|content| matches!(content, Content::ToolUse(_)))
    }

    pub fn is_complete(&self) -> bool {
        self.stop_reason.is_some()
    }
}

impl std::fmt::Display for MessageResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut content_summary = Vec::new();

        let text_parts = self.text_content();
        if !text_parts.is_empty() {
            content_summary.push(format!("text: [{}]", text_parts.join(", ")));
        }

        let thinking_parts = self.thinking_content();
        if !thinking_parts.is_empty() {
            content_summary.push(format!("thinking: [{}]", thinking_parts.len()));
        }

        if self.has_tool_use() {
            content_summary.push("tools".to_string());
        }

        write!(
            f,
            "MessageResponse {{ id: {}, role: {}, model: {}, content: {} }}",
            self.id,
            self.role,
            self.model,
            content_summary.join(", ")
        )
    }
}

// Stream payloads, one per message-family event type.

#[derive(Debug, Clone, Deserialize)]
pub struct MessageStart {
    pub message: MessageResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlockStart {
    pub index: usize,
    pub content_block: Content,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlockDelta {
    pub index: usize,
    pub delta: BlockDelta,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    ThinkingDelta { thinking: String },
    SignatureDelta { signature: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlockStop {
    pub index: usize,
}

/// The `message_delta` patch: top-level stop fields and usage only.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDelta {
    pub delta: MessageDeltaBody,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDeltaBody {
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
}
