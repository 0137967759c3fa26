//! SSE frame reader
//!
//! Turns the raw response body into payload strings. Lines are split on bytes
//! before UTF-8 decoding, so a multi-byte character split across two transport
//! chunks is reassembled intact.

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::utils::error::{DecodeError, Result};

/// Payload that ends the stream
pub const DONE_MARKER: &str = "[DONE]";

/// SSE fields that carry no payload for us
static NON_DATA_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(event|id|retry)\s*:").expect("Invalid SSE field regex"));

/// Response body as a stream of byte chunks
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// One recognised line of the event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Payload(String),
    Done,
}

/// Classify one line, already stripped of its line terminator
pub fn parse_line(line: &str) -> Option<Frame> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with(':') {
        return None;
    }

    let payload = match line.strip_prefix("data:") {
        Some(rest) => rest.trim_start(),
        None if NON_DATA_FIELD.is_match(line) => return None,
        // Bare NDJSON lines
        None => line,
    };
    let payload = payload.trim_end();

    if payload.is_empty() {
        None
    } else if payload == DONE_MARKER {
        Some(Frame::Done)
    } else {
        Some(Frame::Payload(payload.to_string()))
    }
}

/// Incremental line splitter over raw body bytes
#[derive(Debug, Default)]
pub struct SseFrameParser {
    pending: Vec<u8>,
    done: bool,
}

impl SseFrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// The terminal marker has been seen; later bytes are ignored
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one transport chunk and return every frame it completed
    pub fn process_bytes(&mut self, bytes: &[u8]) -> Vec<Frame> {
        if self.done {
            return Vec::new();
        }
        self.pending.extend_from_slice(bytes);

        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.pending[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            let frame = decode_line(&self.pending[consumed..end]);
            consumed = end + 1;

            match frame {
                Some(Frame::Done) => {
                    frames.push(Frame::Done);
                    self.done = true;
                    self.pending.clear();
                    return frames;
                }
                Some(frame) => frames.push(frame),
                None => {}
            }
        }
        self.pending.drain(..consumed);
        frames
    }

    /// End of body: a final line without a newline still counts
    pub fn finish(&mut self) -> Option<Frame> {
        if self.done || self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        decode_line(&line)
    }
}

fn decode_line(raw: &[u8]) -> Option<Frame> {
    parse_line(&String::from_utf8_lossy(raw))
}

enum Read {
    Cancelled,
    Chunk(Option<Result<Bytes>>),
}

/// Read payload strings from a response body until `[DONE]` or end of body
///
/// Cancellation aborts the pending read and ends the sequence with
/// [`DecodeError::Cancelled`].
pub fn frames(mut body: ByteStream, cancel: CancellationToken) -> BoxStream<'static, Result<String>> {
    Box::pin(async_stream::stream! {
        let mut parser = SseFrameParser::new();

        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => Read::Cancelled,
                chunk = body.next() => Read::Chunk(chunk),
            };

            match read {
                Read::Cancelled => {
                    debug!("frame read cancelled");
                    yield Err(DecodeError::cancelled("frame read"));
                    return;
                }
                Read::Chunk(Some(Ok(bytes))) => {
                    for frame in parser.process_bytes(&bytes) {
                        if cancel.is_cancelled() {
                            yield Err(DecodeError::cancelled("frame read"));
                            return;
                        }
                        match frame {
                            Frame::Payload(payload) => yield Ok(payload),
                            Frame::Done => {
                                trace!("received done marker");
                                return;
                            }
                        }
                    }
                }
                Read::Chunk(Some(Err(e))) => {
                    debug!(error = %e, "response body failed");
                    yield Err(e);
                    return;
                }
                Read::Chunk(None) => {
                    if let Some(Frame::Payload(payload)) = parser.finish() {
                        yield Ok(payload);
                    }
                    return;
                }
            }
        }
    })
}
