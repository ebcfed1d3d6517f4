//! Incremental parser for `text/event-stream` completion bodies
//!
//! Network reads do not respect line boundaries, so bytes accumulate until a
//! newline arrives; only complete lines are parsed and the remainder is
//! carried into the next read.

use serde_json::Value;

use crate::types::StreamEvent;

/// Terminal sentinel sent by OpenAI-compatible backends
const DONE_SENTINEL: &str = "[DONE]";

/// Line-buffering state machine over raw SSE bytes
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read and return the events completed by it
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.pending.extend_from_slice(bytes);

        let mut events = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.pending[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            if let Some(event) = parse_line(&self.pending[consumed..end]) {
                events.push(event);
            }
            consumed = end + 1;
        }
        self.pending.drain(..consumed);

        events
    }

    /// Parse whatever is left once the body ends without a trailing newline
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let rest = std::mem::take(&mut self.pending);
        parse_line(&rest)
    }

    /// Bytes waiting for a newline
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn parse_line(line: &[u8]) -> Option<StreamEvent> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    // '\n' never occurs inside a multi-byte sequence, so a complete line is
    // valid UTF-8 whenever the body is
    let Ok(line) = std::str::from_utf8(line) else {
        tracing::debug!(len = line.len(), "skipping non-UTF-8 stream line");
        return None;
    };

    // Comments, blank separators, and `event:`/`id:`/`retry:` fields carry no chunk
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    if data == DONE_SENTINEL {
        return Some(StreamEvent::Done);
    }

    match serde_json::from_str::<Value>(data) {
        Ok(chunk) => Some(StreamEvent::Chunk(chunk)),
        Err(e) => {
            tracing::debug!(error = %e, data, "skipping unparseable stream chunk");
            None
        }
    }
}
