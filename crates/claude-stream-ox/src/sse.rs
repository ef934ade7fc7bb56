//! Incremental framing of `text/event-stream` bodies.
//!
//! The framer owns the bytes of any event that has not been terminated yet,
//! so an event split across several reads is reassembled before it is handed
//! on. Each complete event must carry both an `event:` line and at least one
//! `data:` line; anything else is a framing error.

use crate::error::AnthropicRequestError;

/// A framed event: the `event:` name and the raw `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub event: String,
    pub data: String,
}

impl RawEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    /// Decode the payload, tagging failures with the event name.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, AnthropicRequestError> {
        serde_json::from_str(&self.data).map_err(|source| AnthropicRequestError::Deserialization {
            event: self.event.clone(),
            source,
        })
    }
}

/// Turns a byte stream delivered in arbitrary pieces into [`RawEvent`]s.
#[derive(Debug, Default)]
pub struct EventFramer {
    /// Bytes after the last complete line.
    buffer: Vec<u8>,
    event: Option<String>,
    data: Option<String>,
}

impl EventFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read's worth of bytes, returning every event it completes.
    ///
    /// Unterminated trailing text stays buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<RawEvent>, AnthropicRequestError> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            let line = self.buffer[consumed..end].to_vec();
            consumed = end + 1;
            if let Some(event) = self.process_line(&line)? {
                events.push(event);
            }
        }
        self.buffer.drain(..consumed);

        Ok(events)
    }

    /// Flush at end of stream. A final event missing its blank-line
    /// terminator is still dispatched.
    pub fn finish(&mut self) -> Result<Option<RawEvent>, AnthropicRequestError> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.process_line(&line)?;
        }
        self.dispatch()
    }

    /// Whether any bytes or fields of an unfinished event are held.
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty() || self.event.is_some() || self.data.is_some()
    }

    fn process_line(&mut self, raw: &[u8]) -> Result<Option<RawEvent>, AnthropicRequestError> {
        let line = std::str::from_utf8(raw).map_err(|e| {
            AnthropicRequestError::bad_event(format!("invalid UTF-8 in event stream: {e}"))
        })?;
        let line = line.trim_end_matches(['\r', '\n']);

        if line.is_empty() {
            return self.dispatch();
        }

        // comment / keep-alive
        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => {
                if let Some(previous) = &self.event {
                    return Err(AnthropicRequestError::bad_event(format!(
                        "event `{}` redeclared as `{}` before dispatch",
                        previous,
                        value.trim()
                    )));
                }
                self.event = Some(value.trim().to_string());
            }
            "data" => match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            // `id`, `retry` and unknown fields carry nothing we use.
            _ => {}
        }

        Ok(None)
    }

    fn dispatch(&mut self) -> Result<Option<RawEvent>, AnthropicRequestError> {
        match (self.event.take(), self.data.take()) {
            (None, None) => Ok(None),
            (Some(event), Some(data)) if !event.is_empty() => Ok(Some(RawEvent { event, data })),
            (Some(event), None) => Err(AnthropicRequestError::bad_event(format!(
                "event `{event}` has no data line"
            ))),
            (_, Some(data)) => Err(AnthropicRequestError::bad_event(format!(
                "data without an event type: {data}"
            ))),
        }
    }
}
