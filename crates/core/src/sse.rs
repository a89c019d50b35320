//! Incremental decoder for the server-sent event stream carrying model output.
//!
//! The generation endpoint writes one `data: {piece}` event per model delta and finishes with
//! `data: [DONE]`. Chunks handed to `SseDecoder::feed` may split lines and events at any
//! byte, so the decoder buffers until a full line is available.

use crate::stream::TransportEvent;

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the last `event:` field, if any.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

impl SseEvent {
    /// Maps the event onto the transport contract: `error` events are failures, everything
    /// else carries a text fragment.
    pub fn into_transport_event(self) -> TransportEvent {
        match self.event.as_deref() {
            Some("error") => TransportEvent::Failed(self.data),
            _ => TransportEvent::Fragment(self.data),
        }
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: String,
    event: Option<String>,
    data: Vec<String>,
    has_data: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of the raw stream and returns every event it completed.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.pending.push_str(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let line = line.trim_end_matches('\n').trim_end_matches('\r');
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a trailing line and any event that was not terminated by a blank line.
    pub fn finish(mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.pending);
        let rest = rest.trim_end_matches('\r');
        if !rest.is_empty() {
            if let Some(event) = self.process_line(rest) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data.push(value.to_string());
                self.has_data = true;
            }
            "event" => self.event = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent { event, data })
    }
}

/// Decodes a complete recorded event stream into transport events, in order.
pub fn decode_all(raw: &str) -> Vec<TransportEvent> {
    let mut decoder = SseDecoder::new();
    let mut events: Vec<TransportEvent> = decoder
        .feed(raw)
        .into_iter()
        .map(SseEvent::into_transport_event)
        .collect();
    if let Some(last) = decoder.finish() {
        events.push(last.into_transport_event());
    }
    events
}
