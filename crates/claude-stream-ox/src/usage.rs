use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u32>,
}

impl Usage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_tokens(&self) -> u32 {
        self.input_tokens
            .unwrap_or(0)
            .saturating_add(self.output_tokens.unwrap_or(0))
    }

    pub fn total_input_tokens(&self) -> u32 {
        self.input_tokens
            .unwrap_or(0)
            .saturating_add(self.cache_creation_input_tokens.unwrap_or(0))
            .saturating_add(self.cache_read_input_tokens.unwrap_or(0))
    }

    /// Overwrite every counter `patch` reports; counters it omits are kept.
    pub fn merge(&mut self, patch: &Usage) {
        if patch.input_tokens.is_some() {
            self.input_tokens = patch.input_tokens;
        }
        if patch.output_tokens.is_some() {
            self.output_tokens = patch.output_tokens;
        }
        if patch.cache_creation_input_tokens.is_some() {
            self.cache_creation_input_tokens = patch.cache_creation_input_tokens;
        }
        if patch.cache_read_input_tokens.is_some() {
            self.cache_read_input_tokens = patch.cache_read_input_tokens;
        }
    }
}
