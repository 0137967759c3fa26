//! Structured tool call fragments (OpenAI `delta.tool_calls`)
//!
//! Fragments are routed to a pending call by id, then by wire index, then to
//! the call that is currently open. A call is released as soon as its
//! arguments are brace-balanced and parse as an object.

use tracing::{debug, warn};

use super::assembler::CallSink;
use super::json::{self, JsonScanner};
use crate::core::types::{ToolCallFragment, Update};
use crate::utils::error::{DecodeError, Result};

/// Arguments buffer for one in-flight call
#[derive(Debug, Clone, Default)]
struct PendingCall {
    id: Option<String>,
    index: Option<u32>,
    name: String,
    arguments: String,
    scanner: JsonScanner,
}

impl PendingCall {
    fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && self.scanner.is_balanced()
            && json::parse_object(&self.arguments).is_some()
    }
}

/// Assembler for structured fragments
#[derive(Debug)]
pub struct StructuredAssembler {
    pending: Vec<PendingCall>,
    max_bytes: usize,
}

impl StructuredAssembler {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_bytes,
        }
    }

    /// Number of calls still buffering
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn push_fragments(
        &mut self,
        fragments: &[ToolCallFragment],
        sink: &mut CallSink,
        out: &mut Vec<Update>,
    ) -> Result<()> {
        for fragment in fragments {
            let slot = self.route(fragment);
            let call = &mut self.pending[slot];

            if call.id.is_none() {
                call.id = fragment.id.clone().filter(|id| !id.is_empty());
            }
            if call.index.is_none() {
                call.index = fragment.index;
            }
            if let Some(name) = &fragment.name {
                call.name.push_str(name);
            }
            if let Some(arguments) = &fragment.arguments {
                if call.arguments.len() + arguments.len() > self.max_bytes {
                    return Err(DecodeError::buffer_overflow(
                        call.name.clone(),
                        self.max_bytes,
                    ));
                }
                call.arguments.push_str(arguments);
                call.scanner.feed(arguments);
            }

            if call.is_complete() {
                let call = self.pending.remove(slot);
                sink.emit(call.id.as_deref(), &call.name, call.arguments, out);
            }
        }
        Ok(())
    }

    /// Pick the pending call a fragment belongs to, opening a new one if needed
    fn route(&mut self, fragment: &ToolCallFragment) -> usize {
        let id = fragment.id.as_deref().filter(|id| !id.is_empty());

        if let Some(id) = id {
            if let Some(slot) = self.pending.iter().position(|c| c.id.as_deref() == Some(id)) {
                return slot;
            }
            // Id first seen on a later fragment of a call already opened by index
            if let Some(index) = fragment.index {
                if let Some(slot) = self
                    .pending
                    .iter()
                    .position(|c| c.id.is_none() && c.index == Some(index))
                {
                    return slot;
                }
            }
            return self.open(fragment);
        }

        if let Some(index) = fragment.index {
            if let Some(slot) = self.pending.iter().rposition(|c| c.index == Some(index)) {
                return slot;
            }
            // A new index with a name starts a new call
            if fragment.name.is_some() || self.pending.is_empty() {
                return self.open(fragment);
            }
        }

        if self.pending.is_empty() {
            return self.open(fragment);
        }
        self.pending.len() - 1
    }

    fn open(&mut self, fragment: &ToolCallFragment) -> usize {
        debug!(id = ?fragment.id, index = ?fragment.index, "opening tool call buffer");
        self.pending.push(PendingCall::default());
        self.pending.len() - 1
    }

    /// Release every buffered call on a `tool_calls` finish reason
    ///
    /// Calls whose arguments only parse after repair are emitted with the
    /// repaired text; anything still unparsable is dropped.
    pub(crate) fn flush(&mut self, sink: &mut CallSink, out: &mut Vec<Update>) {
        for call in self.pending.drain(..) {
            if call.name.trim().is_empty() {
                warn!(id = ?call.id, "dropping tool call fragments without a function name");
                continue;
            }

            let arguments = if call.arguments.trim().is_empty() {
                "{}".to_string()
            } else if json::parse_object(&call.arguments).is_some() {
                call.arguments
            } else if let Some((repaired, _)) = json::parse_tolerant(&call.arguments) {
                debug!(tool = %call.name, "emitting tool call with repaired arguments");
                repaired
            } else {
                warn!(
                    tool = %call.name,
                    bytes = call.arguments.len(),
                    "dropping tool call with unparsable arguments"
                );
                continue;
            };

            sink.emit(call.id.as_deref(), &call.name, arguments, out);
        }
    }

    /// End of stream without a `tool_calls` finish reason
    ///
    /// A named call with no argument text is complete as `{}`; partial
    /// arguments are discarded.
    pub(crate) fn finish(&mut self, sink: &mut CallSink, out: &mut Vec<Update>) {
        for call in self.pending.drain(..) {
            if !call.name.trim().is_empty() && call.arguments.trim().is_empty() {
                sink.emit(call.id.as_deref(), &call.name, "{}".to_string(), out);
            } else {
                warn!(
                    tool = %call.name,
                    bytes = call.arguments.len(),
                    "stream ended inside tool call arguments; discarding"
                );
            }
        }
    }
}
