//! Tool calls embedded as tagged blocks in the answer text
//!
//! ```text
//! Let me check.<tool_call>{"name": "get_weather", "arguments": {"city": "NYC"}}</tool_call>
//! ```
//!
//! Text around a block is passed through. Some servers never send the closing
//! tag, so a balanced JSON object right after the open tag is also accepted as
//! a complete block.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::assembler::CallSink;
use super::json;
use crate::core::types::Update;
use crate::utils::error::{DecodeError, Result};

/// Pulls the function name out of a block that is still streaming, for error reporting
static PARTIAL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""name"\s*:\s*"([^"]+)""#).expect("Invalid tool name regex"));

/// A block body parsed into its call parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockCall {
    pub id: Option<String>,
    pub name: String,
    pub arguments: String,
}

/// Assembler for the tagged-block encoding
#[derive(Debug)]
pub struct TaggedAssembler {
    open_tag: String,
    close_tag: String,
    buffer: String,
    strip_close: bool,
    max_bytes: usize,
}

impl TaggedAssembler {
    pub fn new(open_tag: impl Into<String>, close_tag: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            open_tag: open_tag.into(),
            close_tag: close_tag.into(),
            buffer: String::new(),
            strip_close: false,
            max_bytes,
        }
    }

    /// Bytes held back waiting for a block or tag to complete
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn push_text(
        &mut self,
        text: &str,
        sink: &mut CallSink,
        out: &mut Vec<Update>,
    ) -> Result<()> {
        self.buffer.push_str(text);

        loop {
            if self.strip_close && !self.strip_stray_close() {
                return Ok(());
            }

            let Some(start) = self.buffer.find(&self.open_tag) else {
                let held = partial_prefix_len(&self.buffer, &self.open_tag);
                let ready = self.buffer.len() - held;
                if ready > 0 {
                    out.push(Update::Answer(self.buffer.drain(..ready).collect()));
                }
                return Ok(());
            };

            if start > 0 {
                out.push(Update::Answer(self.buffer.drain(..start).collect()));
            }

            let body_start = self.open_tag.len();
            if let Some(rel) = self.buffer[body_start..].find(&self.close_tag) {
                let body_end = body_start + rel;
                let block_end = body_end + self.close_tag.len();
                match parse_block(&self.buffer[body_start..body_end]) {
                    Some(call) => {
                        sink.emit(call.id.as_deref(), &call.name, call.arguments, out);
                    }
                    None => {
                        warn!(bytes = block_end, "tool call block did not parse; emitting as text");
                        out.push(Update::Answer(self.buffer[..block_end].to_string()));
                    }
                }
                self.buffer.drain(..block_end);
                continue;
            }

            // No close tag yet: accept a balanced object right after the open tag
            let after = &self.buffer[body_start..];
            let lead = after.len() - after.trim_start().len();
            let body = &after[lead..];
            if let Some(end) = json::object_end(body) {
                if let Some(call) = parse_block(&body[..end]) {
                    debug!(tool = %call.name, "tool call block completed without close tag");
                    sink.emit(call.id.as_deref(), &call.name, call.arguments, out);
                    self.buffer.drain(..body_start + lead + end);
                    self.strip_close = true;
                    continue;
                }
            }

            if self.buffer.len() > self.max_bytes {
                let name = PARTIAL_NAME
                    .captures(&self.buffer)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                return Err(DecodeError::buffer_overflow(name, self.max_bytes));
            }
            return Ok(());
        }
    }

    /// Drop a close tag left behind by a block sliced without it
    ///
    /// Returns `false` while the buffer could still be the start of that tag.
    fn strip_stray_close(&mut self) -> bool {
        let head = self.buffer.trim_start();
        if head.is_empty() {
            return false;
        }
        if let Some(rest) = head.strip_prefix(self.close_tag.as_str()) {
            self.buffer = rest.to_string();
            self.strip_close = false;
            return true;
        }
        if self.close_tag.starts_with(head) {
            return false;
        }
        self.strip_close = false;
        true
    }

    /// `tool_calls` finish reason: try to salvage an unterminated block
    pub(crate) fn flush(&mut self, sink: &mut CallSink, out: &mut Vec<Update>) {
        if let Some(start) = self.buffer.find(&self.open_tag) {
            let body = &self.buffer[start + self.open_tag.len()..];
            if let Some(call) = parse_block(body) {
                debug!(tool = %call.name, "salvaged unterminated tool call block");
                if start > 0 {
                    out.push(Update::Answer(self.buffer[..start].to_string()));
                }
                sink.emit(call.id.as_deref(), &call.name, call.arguments, out);
                self.buffer.clear();
                return;
            }
        }
        self.finish(out);
    }

    /// End of stream: anything still held is plain text
    pub(crate) fn finish(&mut self, out: &mut Vec<Update>) {
        if self.strip_close && self.close_tag.starts_with(self.buffer.trim_start()) {
            self.buffer.clear();
        }
        self.strip_close = false;

        if self.buffer.is_empty() {
            return;
        }
        if self.buffer.contains(&self.open_tag) {
            warn!(
                bytes = self.buffer.len(),
                "stream ended inside a tool call block; emitting as text"
            );
        }
        out.push(Update::Answer(std::mem::take(&mut self.buffer)));
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of `tag`
fn partial_prefix_len(text: &str, tag: &str) -> usize {
    tag.char_indices()
        .skip(1)
        .map(|(i, _)| i)
        .filter(|&i| text.ends_with(&tag[..i]))
        .max()
        .unwrap_or(0)
}

/// Parse a block body: `{"name": ..., "arguments": {...}}`
///
/// `arguments` may also be called `parameters`, may be a JSON-encoded string,
/// and may sit under a `function` object.
pub(crate) fn parse_block(body: &str) -> Option<BlockCall> {
    let (_, value) = json::parse_tolerant(body)?;
    let function = value.get("function").filter(|f| f.is_object());

    let name = value
        .get("name")
        .or_else(|| function.and_then(|f| f.get("name")))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())?
        .to_string();

    let raw_arguments = value
        .get("arguments")
        .or_else(|| value.get("parameters"))
        .or_else(|| function.and_then(|f| f.get("arguments")));

    let arguments = match raw_arguments {
        None | Some(Value::Null) => "{}".to_string(),
        Some(object @ Value::Object(_)) => serde_json::to_string(object).ok()?,
        Some(Value::String(text)) if text.trim().is_empty() => "{}".to_string(),
        Some(Value::String(text)) => json::parse_tolerant(text)?.0,
        Some(_) => return None,
    };

    let id = value
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    Some(BlockCall {
        id,
        name,
        arguments,
    })
}
