use serde::{Deserialize, Serialize};

use crate::response::StopReason;

/// A completion-endpoint response.
///
/// The same record carries each streamed delta: `completion` then holds only
/// the newly generated text, and `stop_reason` is `None` until the last one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionResponse {
    #[serde(default)]
    pub completion: String,
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    /// The stop sequence that ended generation, when there was one.
    #[serde(default)]
    pub stop: Option<String>,
    #[serde(default)]
    pub model: String,
}

impl CompletionResponse {
    pub fn is_complete(&self) -> bool {
        self.stop_reason.is_some()
    }

    /// Fold a streamed delta into this response.
    pub fn accrete(&mut self, delta: &CompletionResponse) {
        self.completion.push_str(&delta.completion);
        if !delta.model.is_empty() {
            self.model.clone_from(&delta.model);
        }
        if delta.stop_reason.is_some() {
            self.stop_reason = delta.stop_reason;
            self.stop.clone_from(&delta.stop);
        }
    }
}

impl std::fmt::Display for CompletionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.completion)
    }
}
