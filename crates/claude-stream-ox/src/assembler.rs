//! Assembly of a [`MessageResponse`] from the message event family.
//!
//! `message_start` opens the response, each content block is opened, fed
//! deltas and closed in index order, `message_delta` patches the stop fields
//! and usage, and `message_stop` ends the stream.
//!
//! Thinking blocks are kept in the response and streamed as
//! [`Fragment::Thinking`], never as text. Signature deltas only update the
//! block.

use std::str::FromStr;

use crate::{
    error::{AnthropicRequestError, parse_error_event},
    message::Content,
    response::{
        BlockDelta, ContentBlockDelta, ContentBlockStart, ContentBlockStop, MessageDelta,
        MessageResponse, MessageStart,
    },
    sse::RawEvent,
    stream::StreamMachine,
    tool::ToolUseBuilder,
};

/// Event names of the message family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MessageEventKind {
    MessageStart,
    ContentBlockStart,
    ContentBlockDelta,
    ContentBlockStop,
    MessageDelta,
    MessageStop,
    Ping,
    Error,
}

/// Newly produced content, never the accumulated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text { index: usize, text: String },
    /// A piece of a tool-use block's JSON input.
    ToolInput { index: usize, partial_json: String },
    Thinking { index: usize, thinking: String },
}

impl Fragment {
    pub fn index(&self) -> usize {
        match self {
            Self::Text { index, .. }
            | Self::ToolInput { index, .. }
            | Self::Thinking { index, .. } => *index,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::ToolInput { .. } | Self::Thinking { .. } => None,
        }
    }
}

/// The block that currently accepts deltas.
#[derive(Debug, Clone)]
pub struct OpenBlock {
    pub index: usize,
    tool_input: Option<ToolUseBuilder>,
}

#[derive(Debug, Clone, Default)]
pub enum MessageState {
    #[default]
    NotStarted,
    InProgress {
        response: MessageResponse,
        open: Option<OpenBlock>,
    },
    Done(MessageResponse),
}

impl MessageState {
    pub fn response(&self) -> Option<&MessageResponse> {
        match self {
            Self::NotStarted => None,
            Self::InProgress { response, .. } | Self::Done(response) => Some(response),
        }
    }

    pub fn open_block(&self) -> Option<usize> {
        match self {
            Self::InProgress {
                open: Some(block), ..
            } => Some(block.index),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::NotStarted => "before message_start",
            Self::InProgress { response, .. } if response.stop_reason.is_some() => {
                "after the stop reason was set"
            }
            Self::InProgress { .. } => "while the message is in progress",
            Self::Done(_) => "after message_stop",
        }
    }
}

fn close_block(
    response: &mut MessageResponse,
    block: OpenBlock,
) -> Result<(), AnthropicRequestError> {
    let Some(builder) = block.tool_input else {
        return Ok(());
    };
    if let Some(Content::ToolUse(tool_use)) = response.content.get_mut(block.index) {
        builder
            .apply(tool_use)
            .map_err(|source| AnthropicRequestError::Deserialization {
                event: MessageEventKind::ContentBlockDelta.to_string(),
                source,
            })?;
    }
    Ok(())
}

fn start_block(
    response: &mut MessageResponse,
    open: &mut Option<OpenBlock>,
    payload: ContentBlockStart,
) -> Result<Option<Fragment>, AnthropicRequestError> {
    if let Some(previous) = open.take() {
        close_block(response, previous)?;
    }

    let index = response.content.len();
    if payload.index != index {
        return Err(AnthropicRequestError::bad_event(format!(
            "content_block_start for index {} but the next block is {index}",
            payload.index
        )));
    }

    let (tool_input, fragment) = match &payload.content_block {
        Content::ToolUse(_) => (Some(ToolUseBuilder::new()), None),
        Content::Text(text) if !text.is_empty() => (
            None,
            Some(Fragment::Text {
                index,
                text: text.as_str().to_string(),
            }),
        ),
        Content::Thinking(thinking) if !thinking.text.is_empty() => (
            None,
            Some(Fragment::Thinking {
                index,
                thinking: thinking.text.clone(),
            }),
        ),
        _ => (None, None),
    };
    response.content.push(payload.content_block);

    *open = Some(OpenBlock { index, tool_input });
    Ok(fragment)
}

fn apply_delta(
    response: &mut MessageResponse,
    open: &mut Option<OpenBlock>,
    payload: ContentBlockDelta,
) -> Result<Option<Fragment>, AnthropicRequestError> {
    let Some(block) = open.as_mut().filter(|block| block.index == payload.index) else {
        return Err(AnthropicRequestError::bad_event(format!(
            "content_block_delta for block {} which is not the open block",
            payload.index
        )));
    };
    let index = block.index;

    let fragment = match (payload.delta, response.content.get_mut(index)) {
        (BlockDelta::TextDelta { text }, Some(Content::Text(block_text))) => {
            block_text.push_str(&text);
            Some(Fragment::Text { index, text })
        }
        (BlockDelta::InputJsonDelta { partial_json }, Some(Content::ToolUse(_))) => {
            if let Some(builder) = block.tool_input.as_mut() {
                builder.push_str(&partial_json);
            }
            Some(Fragment::ToolInput {
                index,
                partial_json,
            })
        }
        (BlockDelta::ThinkingDelta { thinking }, Some(Content::Thinking(block_thinking))) => {
            block_thinking.text.push_str(&thinking);
            Some(Fragment::Thinking { index, thinking })
        }
        (BlockDelta::SignatureDelta { signature }, Some(Content::Thinking(block_thinking))) => {
            block_thinking
                .signature
                .get_or_insert_with(String::new)
                .push_str(&signature);
            None
        }
        (delta, content) => {
            return Err(AnthropicRequestError::bad_event(format!(
                "{delta:?} does not apply to block {index} ({})",
                content.map_or("missing", |content| content.kind())
            )));
        }
    };

    Ok(fragment)
}

impl StreamMachine for MessageState {
    type Response = MessageResponse;
    type Fragment = Fragment;

    fn start() -> Self {
        Self::NotStarted
    }

    fn apply(&mut self, event: &RawEvent) -> Result<Option<Fragment>, AnthropicRequestError> {
        use MessageEventKind as Kind;

        let kind = Kind::from_str(&event.event).map_err(|_| {
            AnthropicRequestError::bad_event(format!(
                "unexpected `{}` event in message stream",
                event.event
            ))
        })?;

        match (&mut *self, kind) {
            (Self::NotStarted | Self::InProgress { .. }, Kind::Ping) => Ok(None),
            (Self::NotStarted | Self::InProgress { .. }, Kind::Error) => {
                Err(parse_error_event(&event.data))
            }
            (Self::NotStarted, Kind::MessageStart) => {
                let MessageStart { message } = event.decode()?;
                *self = Self::InProgress {
                    response: message,
                    open: None,
                };
                Ok(None)
            }
            (Self::InProgress { response, open }, Kind::ContentBlockStart)
                if response.stop_reason.is_none() =>
            {
                start_block(response, open, event.decode()?)
            }
            (Self::InProgress { response, open }, Kind::ContentBlockDelta)
                if response.stop_reason.is_none() =>
            {
                apply_delta(response, open, event.decode()?)
            }
            (Self::InProgress { response, open }, Kind::ContentBlockStop)
                if response.stop_reason.is_none() =>
            {
                let ContentBlockStop { index } = event.decode()?;
                match open.take() {
                    Some(block) if block.index == index => {
                        close_block(response, block)?;
                        Ok(None)
                    }
                    other => {
                        *open = other;
                        Err(AnthropicRequestError::bad_event(format!(
                            "content_block_stop for block {index} which is not open"
                        )))
                    }
                }
            }
            (Self::InProgress { response, open }, Kind::MessageDelta)
                if response.stop_reason.is_none() =>
            {
                let MessageDelta { delta, usage } = event.decode()?;
                if let Some(block) = open.take() {
                    close_block(response, block)?;
                }
                if delta.stop_reason.is_some() {
                    response.stop_reason = delta.stop_reason;
                    response.stop_sequence = delta.stop_sequence;
                }
                if let Some(usage) = usage {
                    response.usage.merge(&usage);
                }
                Ok(None)
            }
            (Self::InProgress { response, open }, Kind::MessageStop) => {
                if let Some(block) = open.take() {
                    close_block(response, block)?;
                }
                let response = std::mem::take(response);
                *self = Self::Done(response);
                Ok(None)
            }
            (state, kind) => Err(AnthropicRequestError::bad_event(format!(
                "`{kind}` event {}",
                state.describe()
            ))),
        }
    }

    fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    fn snapshot(&self) -> MessageResponse {
        self.response().cloned().unwrap_or_default()
    }

    fn into_response(self) -> MessageResponse {
        match self {
            Self::NotStarted => MessageResponse::default(),
            Self::InProgress { response, .. } | Self::Done(response) => response,
        }
    }
}
