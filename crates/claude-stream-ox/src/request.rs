use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    message::{Message, ShortHandMessage},
    tool::{Tool, ToolChoice},
};

/// Request metadata. `user_id` should be an opaque identifier, never
/// personal information.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Metadata {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }
}

/// A messages-endpoint request, generic over the message shape: structured
/// [`Message`]s or text-only [`ShortHandMessage`]s.
///
/// The `stream` flag is not part of the record; the client sets it per call.
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
pub struct MessageRequest<M> {
    #[builder(into)]
    pub model: String,
    pub messages: Vec<M>,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[builder(default = 4096)]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

pub type ShortHandMessageRequest = MessageRequest<ShortHandMessage>;

impl<M> MessageRequest<M> {
    pub fn push_message(&mut self, message: impl Into<M>) {
        self.messages.push(message.into());
    }

    /// Set temperature for response randomness (0.0 to 1.0)
    #[must_use]
    pub fn temp(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Add a single stop sequence
    #[must_use]
    pub fn stop_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.stop_sequences
            .get_or_insert_with(Vec::new)
            .push(sequence.into());
        self
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.get_or_insert_with(Vec::new).push(tool);
        self
    }
}

impl MessageRequest<Message> {
    /// Convenience for a single user turn.
    pub fn user(model: impl Into<String>, text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self::builder()
            .model(model)
            .messages(vec![Message::from(text)])
            .build()
    }
}

impl MessageRequest<ShortHandMessage> {
    /// Convenience for a single user turn.
    pub fn shorthand(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self::builder()
            .model(model)
            .messages(vec![ShortHandMessage::user(text)])
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{message::Role, model::Model};
    use serde_json::json;

    #[test]
    fn optional_fields_are_omitted() {
        let request = MessageRequest::user(Model::Claude35Haiku20241022, "Hello");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "model": "claude-3-5-haiku-20241022",
                "messages": [{"role": "user", "content": [{"type": "text", "text": "Hello"}]}],
                "max_tokens": 4096
            })
        );
    }

    #[test]
    fn shorthand_request_sends_string_content() {
        let request = MessageRequest::<ShortHandMessage>::builder()
            .model("claude-3-haiku-20240307")
            .messages(vec![
                ShortHandMessage::user("Hi"),
                ShortHandMessage::new(Role::Assistant, "Hello"),
            ])
            .system("Be brief.")
            .max_tokens(64)
            .build()
            .stop_sequence("###")
            .temp(0.2);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "Hi"}));
        assert_eq!(value["system"], "Be brief.");
        assert_eq!(value["max_tokens"], 64);
        assert_eq!(value["stop_sequences"], json!(["###"]));
        assert!(value.get("stream").is_none());
    }

    #[test]
    fn request_round_trips_through_json() {
        let json = r#"{
            "model": "claude-3-5-sonnet-20241022",
            "max_tokens": 1024,
            "messages": [{"role": "user", "content": "Hello world"}],
            "metadata": {"user_id": "u-1"}
        }"#;

        let request: ShortHandMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.messages[0].content, "Hello world");
        assert_eq!(request.metadata, Some(Metadata::user("u-1")));
    }
}
