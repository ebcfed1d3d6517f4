//! Client-facing relay over a backend chunk stream
//!
//! Relabels each chunk, accumulates output for token accounting, and
//! records the routing log entry exactly once when the stream finishes,
//! fails, or is dropped by the client.

use std::time::Instant;

use futures_util::StreamExt;
use serde_json::Value;
use tiergate_telemetry::{RoutingLogEntry, RoutingTelemetry};

use crate::provider::ChunkStream;
use crate::types::{StreamEvent, Usage, approx_tokens, delta_text_chars, relabel_model};

/// Pending log entry for one streamed request
pub(crate) struct StreamAccounting {
    telemetry: RoutingTelemetry,
    entry: Option<RoutingLogEntry>,
    started: Instant,
    forward_started: Instant,
    output_chars: usize,
    usage: Option<Usage>,
}

impl StreamAccounting {
    /// `entry` carries everything known before the first chunk; tokens and
    /// latencies are filled in when the stream ends
    pub(crate) const fn new(
        telemetry: RoutingTelemetry,
        entry: RoutingLogEntry,
        started: Instant,
        forward_started: Instant,
    ) -> Self {
        Self {
            telemetry,
            entry: Some(entry),
            started,
            forward_started,
            output_chars: 0,
            usage: None,
        }
    }

    fn observe(&mut self, chunk: &Value) {
        self.output_chars += delta_text_chars(chunk);
        if let Some(usage) = Usage::from_body(chunk) {
            self.usage = Some(usage);
        }
    }

    fn request_id(&self) -> &str {
        self.entry.as_ref().map_or("", |entry| entry.request_id.as_str())
    }

    fn finish(&mut self) {
        let Some(mut entry) = self.entry.take() else {
            return;
        };

        match self.usage {
            Some(usage) => {
                entry.tokens_in = usage.prompt_tokens;
                entry.tokens_out = usage.completion_tokens;
            }
            None => entry.tokens_out = approx_tokens(self.output_chars),
        }
        entry.total_latency_ms = crate::state::millis(self.started.elapsed());
        entry.forwarding_latency_ms = crate::state::millis(self.forward_started.elapsed());

        self.telemetry.record(entry);
    }
}

impl Drop for StreamAccounting {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Relay `upstream` until its end marker or first error
///
/// Always ends with [`StreamEvent::Done`] unless an error was relayed, in
/// which case the error is the last item.
pub(crate) fn relay(mut upstream: ChunkStream, public_model: Option<String>, mut accounting: StreamAccounting) -> ChunkStream {
    Box::pin(async_stream::stream! {
        loop {
            match upstream.next().await {
                Some(Ok(StreamEvent::Chunk(mut chunk))) => {
                    accounting.observe(&chunk);
                    if let Some(model) = &public_model {
                        relabel_model(&mut chunk, model);
                    }
                    yield Ok(StreamEvent::Chunk(chunk));
                }
                Some(Ok(StreamEvent::Done)) | None => {
                    yield Ok(StreamEvent::Done);
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!(request_id = %accounting.request_id(), error = %e, "stream failed after relay started");
                    yield Err(e);
                    break;
                }
            }
        }
    })
}
