//! Prompt strings for the legacy completion endpoint.
//!
//! The completion endpoint takes a single string in which every turn is
//! introduced by `\n\nHuman:` or `\n\nAssistant:`, and which must end with
//! an assistant turn for the model to continue.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Speaker {
    #[strum(to_string = "\n\nHuman")]
    Human,
    #[strum(to_string = "\n\nAssistant")]
    Assistant,
    /// Leading instructions, rendered without a speaker tag.
    #[strum(to_string = "System")]
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub speaker: Speaker,
    pub text: String,
}

impl PromptMessage {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::new(Speaker::Human, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Speaker::System, text)
    }
}

impl fmt::Display for PromptMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.speaker {
            Speaker::System => f.write_str(&self.text),
            speaker => write!(f, "{speaker}: {}", self.text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("messages cannot be empty")]
    Empty,
    #[error("system messages must be the first message in the dialogue")]
    MisplacedSystem,
    #[error("the final message in the dialogue must be from the assistant")]
    MissingAssistant,
}

/// Check that a dialogue renders to a prompt the completion endpoint accepts.
pub fn validate(messages: &[PromptMessage]) -> Result<(), PromptError> {
    let Some(last) = messages.last() else {
        return Err(PromptError::Empty);
    };
    if messages
        .iter()
        .skip(1)
        .any(|message| message.speaker == Speaker::System)
    {
        return Err(PromptError::MisplacedSystem);
    }
    if last.speaker != Speaker::Assistant {
        return Err(PromptError::MissingAssistant);
    }
    Ok(())
}

/// The rendered prompt sent to the completion endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prompt(String);

impl Prompt {
    /// Render a dialogue without validating it. An invalid dialogue is
    /// rejected by the API rather than here.
    pub fn from_messages(messages: &[PromptMessage]) -> Self {
        Self(messages.iter().map(ToString::to_string).collect())
    }

    pub fn from_valid_messages(messages: &[PromptMessage]) -> Result<Self, PromptError> {
        validate(messages)?;
        Ok(Self::from_messages(messages))
    }

    /// A single human question followed by an open assistant turn.
    pub fn from_question(question: &str) -> Self {
        Self(format!("\n\nHuman: {question}\n\nAssistant:"))
    }

    pub fn with_system(system: &str, human: &str) -> Self {
        Self(format!("{system}{}", Self::from_question(human)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Prompt {
    fn from(prompt: String) -> Self {
        Self(prompt)
    }
}

impl From<&str> for Prompt {
    fn from(prompt: &str) -> Self {
        Self(prompt.to_string())
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
