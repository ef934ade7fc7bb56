use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::{prompt::Prompt, request::Metadata};

/// A completion-endpoint request.
///
/// The `stream` flag is set by the client per call.
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
pub struct CompletionRequest {
    #[builder(into)]
    pub prompt: Prompt,
    #[builder(into)]
    pub model: String,
    #[builder(default = 256)]
    pub max_tokens_to_sample: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CompletionRequest {
    /// A single question to `model`, with default sampling.
    pub fn question(model: impl Into<String>, question: &str) -> Self {
        Self::builder()
            .prompt(Prompt::from_question(question))
            .model(model)
            .build()
    }
}
