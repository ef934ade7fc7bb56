use std::str::FromStr;

use crate::{
    error::{AnthropicRequestError, parse_error_event},
    sse::RawEvent,
    stream::StreamMachine,
};

use super::CompletionResponse;

/// Event names of the completion family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CompletionEventKind {
    Completion,
    Error,
    Ping,
}

/// Completion streams run until a delta carries a stop reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionState {
    Running(CompletionResponse),
    Done(CompletionResponse),
}

impl Default for CompletionState {
    fn default() -> Self {
        Self::Running(CompletionResponse::default())
    }
}

impl CompletionState {
    pub fn response(&self) -> &CompletionResponse {
        match self {
            Self::Running(response) | Self::Done(response) => response,
        }
    }
}

impl StreamMachine for CompletionState {
    type Response = CompletionResponse;
    /// The per-event delta, exactly as received.
    type Fragment = CompletionResponse;

    fn start() -> Self {
        Self::default()
    }

    fn apply(
        &mut self,
        event: &RawEvent,
    ) -> Result<Option<CompletionResponse>, AnthropicRequestError> {
        let kind = CompletionEventKind::from_str(&event.event).map_err(|_| {
            AnthropicRequestError::bad_event(format!(
                "unexpected `{}` event in completion stream",
                event.event
            ))
        })?;

        let Self::Running(response) = &mut *self else {
            return Err(AnthropicRequestError::bad_event(format!(
                "`{kind}` event after the completion stopped"
            )));
        };

        match kind {
            CompletionEventKind::Ping => Ok(None),
            CompletionEventKind::Error => Err(parse_error_event(&event.data)),
            CompletionEventKind::Completion => {
                let delta: CompletionResponse = event.decode()?;
                response.accrete(&delta);
                if delta.is_complete() {
                    let response = std::mem::take(response);
                    *self = Self::Done(response);
                }
                Ok(Some(delta))
            }
        }
    }

    fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    fn snapshot(&self) -> CompletionResponse {
        self.response().clone()
    }

    fn into_response(self) -> CompletionResponse {
        match self {
            Self::Running(response) | Self::Done(response) => response,
        }
    }
}
