//! Name-prefixed free-text tool calls
//!
//! Some servers stream a call as the bare function name followed by its JSON
//! arguments, all as ordinary visible text:
//!
//! ```text
//! get_weather
//! {"city": "NYC"}
//! ```
//!
//! The buffer is held back while it could still be a candidate name. Once it
//! grows past the longest candidate without matching, it is released as text
//! and detection stays off for the rest of the turn. A completed call ends the
//! turn: nothing after it is guaranteed to belong to the answer.

use regex::Regex;
use tracing::{debug, trace, warn};

use super::assembler::CallSink;
use super::json;
use crate::core::types::Update;
use crate::utils::error::{DecodeError, Result};

/// Assembler for the name-prefixed encoding
#[derive(Debug)]
pub struct NamePrefixedAssembler {
    candidates: Vec<String>,
    longest: usize,
    call_pattern: Option<Regex>,
    buffer: String,
    /// Whitespace that preceded the latched name
    lead: String,
    latched: Option<String>,
    frozen: bool,
    complete: bool,
    max_bytes: usize,
}

impl NamePrefixedAssembler {
    pub fn new(candidates: &[String], max_bytes: usize) -> Result<Self> {
        let mut candidates: Vec<String> = candidates
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        candidates.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        candidates.dedup();

        let longest = candidates
            .iter()
            .map(|c| c.chars().count())
            .max()
            .unwrap_or(0);

        let call_pattern = if candidates.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = candidates.iter().map(|c| regex::escape(c)).collect();
            let pattern = format!(r"(?s)^\s*({})\s*(\{{.*)$", alternatives.join("|"));
            Some(Regex::new(&pattern).map_err(|e| {
                DecodeError::configuration(format!("Invalid tool name pattern: {}", e))
            })?)
        };

        Ok(Self {
            candidates,
            longest,
            call_pattern,
            buffer: String::new(),
            lead: String::new(),
            latched: None,
            frozen: false,
            complete: false,
            max_bytes,
        })
    }

    /// A call was emitted and the turn must end
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Candidate matching was abandoned for this turn
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn latched_name(&self) -> Option<&str> {
        self.latched.as_deref()
    }

    pub(crate) fn push_text(
        &mut self,
        text: &str,
        sink: &mut CallSink,
        out: &mut Vec<Update>,
    ) -> Result<()> {
        if self.complete {
            trace!(bytes = text.len(), "ignoring text after name-prefixed call");
            return Ok(());
        }
        if self.frozen {
            out.push(Update::Answer(text.to_string()));
            return Ok(());
        }

        self.buffer.push_str(text);
        if self.latched.is_none() {
            self.try_latch(out);
        }
        if self.latched.is_some() {
            self.try_complete(sink, out)?;
        }
        Ok(())
    }

    fn try_latch(&mut self, out: &mut Vec<Update>) {
        let head = self.buffer.trim_start();
        let lead_len = self.buffer.len() - head.len();

        let exact = self.candidates.iter().find(|c| c.as_str() == head.trim_end());
        // Name and the start of its arguments may arrive in the same piece
        let prefixed = || {
            self.candidates.iter().find(|c| {
                head.strip_prefix(c.as_str()).is_some_and(|rest| {
                    rest.starts_with(|ch: char| ch.is_whitespace() || ch == '{')
                })
            })
        };

        if let Some(name) = exact.or_else(prefixed).cloned() {
            debug!(tool = %name, "latched tool name from text");
            // Whatever follows the name is kept so a released latch reads as it arrived
            let rest = head[name.len()..].to_string();
            self.lead = self.buffer[..lead_len].to_string();
            self.latched = Some(name);
            self.buffer = rest;
            return;
        }

        if head.chars().count() > self.longest {
            trace!("buffer outgrew every candidate name; releasing as text");
            out.push(Update::Answer(std::mem::take(&mut self.buffer)));
            self.frozen = true;
        }
    }

    fn try_complete(&mut self, sink: &mut CallSink, out: &mut Vec<Update>) -> Result<()> {
        let Some(name) = self.latched.clone() else {
            return Ok(());
        };

        if self.buffer.len() > self.max_bytes {
            return Err(DecodeError::buffer_overflow(name, self.max_bytes));
        }

        let head = self.buffer.trim_start();
        if head.is_empty() {
            return Ok(());
        }
        if !head.starts_with('{') {
            debug!(tool = %name, "candidate name was followed by prose");
            self.release_latched(out);
            return Ok(());
        }

        let Some(pattern) = &self.call_pattern else {
            return Ok(());
        };
        let combined = format!("{}{}", name, self.buffer);
        let Some(body) = pattern
            .captures(&combined)
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str())
        else {
            return Ok(());
        };

        // Arguments still streaming
        let Some(end) = json::object_end(body) else {
            return Ok(());
        };

        match json::parse_tolerant(&body[..end]) {
            Some((arguments, _)) => {
                let trailing = body[end..].trim();
                if !trailing.is_empty() {
                    debug!(bytes = trailing.len(), "dropping text after name-prefixed call");
                }
                sink.emit(None, &name, arguments, out);
                self.latched = None;
                self.lead.clear();
                self.buffer.clear();
                self.complete = true;
            }
            None => {
                warn!(tool = %name, "balanced arguments failed to parse; releasing as text");
                self.release_latched(out);
            }
        }
        Ok(())
    }

    fn release_latched(&mut self, out: &mut Vec<Update>) {
        let mut text = std::mem::take(&mut self.lead);
        text.push_str(&self.latched.take().unwrap_or_default());
        text.push_str(&self.buffer);
        self.buffer.clear();
        self.frozen = true;
        if !text.is_empty() {
            out.push(Update::Answer(text));
        }
    }

    /// `tool_calls` finish reason: last chance to salvage a latched call
    pub(crate) fn flush(&mut self, sink: &mut CallSink, out: &mut Vec<Update>) {
        if let Some(name) = self.latched.clone() {
            let head = self.buffer.trim_start();
            if head.starts_with('{') {
                if let Some((arguments, _)) = json::parse_tolerant(head) {
                    sink.emit(None, &name, arguments, out);
                    self.latched = None;
                    self.lead.clear();
                    self.buffer.clear();
                    self.complete = true;
                    return;
                }
            }
        }
        self.finish(out);
    }

    /// End of stream: whatever is still held is plain text
    pub(crate) fn finish(&mut self, out: &mut Vec<Update>) {
        if self.complete {
            return;
        }
        if let Some(name) = &self.latched {
            warn!(tool = %name, "stream ended before arguments completed; emitting as text");
            self.release_latched(out);
        } else if !self.buffer.is_empty() {
            out.push(Update::Answer(std::mem::take(&mut self.buffer)));
        }
    }
}
