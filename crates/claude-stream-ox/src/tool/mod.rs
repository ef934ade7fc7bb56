use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::message::ImageSource;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    Auto,
    Any,
    Tool { name: String },
}

impl ToolChoice {
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool { name: name.into() }
    }
}

/// A tool the model may call, described by a JSON schema for its input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({"type": "object", "properties": {}}),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Derive the input schema from a type.
    #[cfg(feature = "schema")]
    pub fn from_type<T: schemars::JsonSchema>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        let schema = serde_json::to_value(schemars::schema_for!(T))?;
        Ok(Self::new(name, description).with_schema(schema))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

impl ToolUse {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

impl fmt::Display for ToolUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToolUse(id: {}, name: {})", self.id, self.name)
    }
}

/// Collects the `partial_json` fragments streamed for a tool-use block.
#[derive(Debug, Default, Clone)]
pub struct ToolUseBuilder {
    input: String,
}

impl ToolUseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, s: &str) {
        self.input.push_str(s);
    }

    pub fn is_empty(&self) -> bool {
        self.input.trim().is_empty()
    }

    /// Parse the collected input. Nothing collected leaves `tool_use.input`
    /// as it arrived in the block start.
    pub fn apply(self, tool_use: &mut ToolUse) -> Result<(), serde_json::Error> {
        if !self.is_empty() {
            tool_use.input = serde_json::from_str(&self.input)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_use_id: String,
    #[serde(deserialize_with = "string_or_contents")]
    pub content: Vec<ToolResultContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResultContent {
    Text { text: String },
    Image { source: ImageSource },
}

impl ToolResult {
    pub fn new(tool_use_id: impl Into<String>, content: Vec<ToolResultContent>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content,
            is_error: None,
        }
    }

    pub fn text(tool_use_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(tool_use_id, vec![ToolResultContent::Text { text: text.into() }])
    }

    pub fn error(tool_use_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            is_error: Some(true),
            ..Self::text(tool_use_id, error)
        }
    }
}

impl fmt::Display for ToolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToolResult(id: {})", self.tool_use_id)
    }
}

/// Tool results may carry a bare string instead of a block list.
fn string_or_contents<'de, D>(deserializer: D) -> Result<Vec<ToolResultContent>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        String(String),
        Contents(Vec<ToolResultContent>),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::String(text) => vec![ToolResultContent::Text { text }],
        Repr::Contents(contents) => contents,
    })
}
