//! Server-push event framing.
//!
//! The scheduler pushes `text/event-stream` frames. Only `data:` lines matter: each one
//! carries a JSON event record. Everything else (`event:` lines, comments, keep-alive blank
//! lines) is dropped, and a payload that fails to decode is logged and dropped without
//! interrupting the stream. A line longer than the configured limit is dropped the same way.
use futures_util::{Stream, StreamExt, stream};
use tracing::{trace, warn};

use regsync_model::Event;

use crate::{
    error::{SyncError, SyncResult},
    metrics::{MetricsHandle, noop_metrics},
};

/// Literal prefix of a data line.
pub const DATA_PREFIX: &[u8] = b"data:";
/// Shortest line (newline included) that can carry a payload.
pub const MIN_LINE_LEN: usize = 7;
/// Default cap on a single line, newline excluded.
pub const MAX_LINE_LEN: usize = 1 << 20;
/// Longest payload excerpt written to the log for a malformed line.
const LOG_EXCERPT: usize = 256;

/// Classification of a single framed line.
#[derive(Debug)]
pub enum Line {
    /// A decoded event record.
    Event(Event),
    /// Not a data line, or too short to be one.
    Skipped,
    /// A data line whose payload failed to decode.
    Malformed(serde_json::Error),
}

/// Classify one line (including its trailing newline, if any).
///
/// The payload starts after `data:` and one optional space.
pub fn parse_line(line: &[u8]) -> Line {
    if line.len() < MIN_LINE_LEN || !line.starts_with(DATA_PREFIX) {
        return Line::Skipped;
    }
    let payload = &line[DATA_PREFIX.len()..];
    let payload = payload.strip_prefix(b" ").unwrap_or(payload);

    match serde_json::from_slice::<Event>(payload) {
        Ok(event) => Line::Event(event),
        Err(e) => Line::Malformed(e),
    }
}

/// Turns a raw byte stream into a lazy sequence of [`Event`]s.
///
/// The sequence is unbounded and cannot be restarted. It ends with an error when the
/// underlying stream fails ([`SyncError::Transport`]) or closes ([`SyncError::StreamEnded`]);
/// no reconnect happens here.
pub struct EventStreamParser<S> {
    inner: S,
    buf: Vec<u8>,
    /// Bytes of `buf` already known to contain no newline.
    scanned: usize,
    max_line: usize,
    /// Dropping the rest of an oversized line up to its newline.
    discarding: bool,
    metrics: MetricsHandle,
}

impl<S> EventStreamParser<S>
where
    S: Stream<Item = SyncResult<bytes::Bytes>> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            scanned: 0,
            max_line: MAX_LINE_LEN,
            discarding: false,
            metrics: noop_metrics(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    /// Wait for the next decodable event.
    pub async fn next_event(&mut self) -> SyncResult<Event> {
        loop {
            while let Some(line) = self.take_line() {
                match parse_line(&line) {
                    Line::Event(event) => return Ok(event),
                    Line::Skipped => {
                        trace!(len = line.len(), "non-data line dropped");
                    }
                    Line::Malformed(e) => {
                        self.metrics.record_decode_failure();
                        warn!(error = %e, data = %excerpt(&line), "undecodable event dropped");
                    }
                }
            }

            if self.buf.len() > self.max_line {
                self.metrics.record_decode_failure();
                warn!(
                    len = self.buf.len(),
                    limit = self.max_line,
                    data = %excerpt(&self.buf),
                    "oversized line dropped"
                );
                self.buf.clear();
                self.scanned = 0;
                self.discarding = true;
            }

            match self.inner.next().await {
                Some(Ok(chunk)) => self.push(&chunk),
                Some(Err(e)) => return Err(e),
                None => return Err(SyncError::StreamEnded),
            }
        }
    }

    /// Adapt into a [`Stream`] that yields events and ends after its first error.
    pub fn into_stream(self) -> impl Stream<Item = SyncResult<Event>> {
        stream::unfold(Some(self), |state| async move {
            let mut parser = state?;
            match parser.next_event().await {
                Ok(event) => Some((Ok(event), Some(parser))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    fn push(&mut self, chunk: &[u8]) {
        if !self.discarding {
            self.buf.extend_from_slice(chunk);
            return;
        }
        if let Some(pos) = chunk.iter().position(|b| *b == b'\n') {
            self.discarding = false;
            self.buf.extend_from_slice(&chunk[pos + 1..]);
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        match self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            Some(pos) => {
                let end = self.scanned + pos;
                self.scanned = 0;
                Some(self.buf.drain(..=end).collect())
            }
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }
}

fn excerpt(line: &[u8]) -> String {
    let text = String::from_utf8_lossy(line);
    let text = text.trim_end();
    match text.char_indices().nth(LOG_EXCERPT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
