use std::{fmt, path::Path};

use base64::Engine;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::tool::{ToolResult, ToolUse};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ImageSource {
    #[serde(rename = "base64")]
    Base64 { media_type: String, data: String },
}

impl ImageSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        Ok(ImageSource::Base64 {
            media_type,
            data: base64::engine::general_purpose::STANDARD.encode(data),
        })
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Base64 { media_type, data } => {
                let preview: String = data.chars().take(20).collect();
                let ellipsis = if data.len() > preview.len() { "..." } else { "" };
                write!(f, "Base64 ({media_type}, {preview}{ellipsis})")
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Image {
    pub source: ImageSource,
}

impl Image {
    pub fn new(source: ImageSource) -> Self {
        Self { source }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        Ok(Self::new(ImageSource::from_path(path)?))
    }

    pub fn from_base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(ImageSource::Base64 {
            media_type: media_type.into(),
            data: data.into(),
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Text {
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn push_str(&mut self, string: &str) {
        self.text.push_str(string);
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Text { text }
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text {
            text: text.to_owned(),
        }
    }
}

impl From<Text> for String {
    fn from(text: Text) -> Self {
        text.text
    }
}

/// Extended-thinking output. The wire field is `thinking`.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ThinkingContent {
    #[serde(rename = "thinking", default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ThinkingContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            signature: None,
        }
    }

    pub fn with_signature(text: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            signature: Some(signature.into()),
        }
    }
}

/// Thinking the API returns encrypted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RedactedThinking {
    pub data: String,
}

/// One addressable unit of message content.
///
/// Responses carry these as their ordered block list; the same shape is
/// used for request content.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text(Text),
    Image(Image),
    ToolUse(ToolUse),
    ToolResult(ToolResult),
    Thinking(ThinkingContent),
    RedactedThinking(RedactedThinking),
}

impl Content {
    pub fn text<T: Into<String>>(text: T) -> Self {
        Self::Text(Text { text: text.into() })
    }

    pub fn image(source: ImageSource) -> Self {
        Self::Image(Image { source })
    }

    pub fn as_text(&self) -> Option<&Text> {
        if let Self::Text(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUse> {
        if let Self::ToolUse(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_thinking(&self) -> Option<&ThinkingContent> {
        if let Self::Thinking(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_tool_result(&self) -> Option<&ToolResult> {
        if let Self::ToolResult(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// The wire tag of this block, as used in `content_block_start`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::ToolUse(_) => "tool_use",
            Self::ToolResult(_) => "tool_result",
            Self::Thinking(_) => "thinking",
            Self::RedactedThinking(_) => "redacted_thinking",
        }
    }
}

impl<T: Into<Text>> From<T> for Content {
    fn from(text: T) -> Self {
        Content::Text(text.into())
    }
}

impl From<Image> for Content {
    fn from(image: Image) -> Self {
        Content::Image(image)
    }
}

impl From<ToolUse> for Content {
    fn from(tool_use: ToolUse) -> Self {
        Content::ToolUse(tool_use)
    }
}

impl From<ToolResult> for Content {
    fn from(tool_result: ToolResult) -> Self {
        Content::ToolResult(tool_result)
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(&text.text),
            Self::Image(image) => write!(f, "Image: {}", image.source),
            Self::ToolUse(tool_use) => fmt::Display::fmt(tool_use, f),
            Self::ToolResult(tool_result) => fmt::Display::fmt(tool_result, f),
            Self::Thinking(thinking) => write!(f, "Thinking: {}", thinking.text),
            Self::RedactedThinking(_) => f.write_str("Thinking: [redacted]"),
        }
    }
}

/// A message with structured content blocks.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<Content>,
}

impl Message {
    pub fn new(role: Role, content: Vec<Content>) -> Self {
        Self { role, content }
    }

    pub fn user<T: Into<Content>>(content: Vec<T>) -> Self {
        Self {
            role: Role::User,
            content: content.into_iter().map(Into::into).collect(),
        }
    }

    pub fn assistant<T: Into<Content>>(content: Vec<T>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add_content<T: Into<Content>>(&mut self, content: T) {
        self.content.push(content.into());
    }
}

impl<T: Into<Content>> From<T> for Message {
    fn from(content: T) -> Self {
        Message::user(vec![content])
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.role)?;
        for (i, content) in self.content.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{content}")?;
        }
        Ok(())
    }
}

/// A text-only message whose content is sent as a bare string.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ShortHandMessage {
    pub role: Role,
    pub content: String,
}

impl ShortHandMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

impl From<&str> for ShortHandMessage {
    fn from(content: &str) -> Self {
        Self::user(content)
    }
}

impl From<String> for ShortHandMessage {
    fn from(content: String) -> Self {
        Self::user(content)
    }
}

impl fmt::Display for ShortHandMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.content)
    }
}
