//! Tool call assembly front end
//!
//! [`ToolCallAssembler`] owns the one strategy selected by the decoder profile
//! and the id allocator shared by every call of the turn. All emitted calls go
//! through [`CallSink`], which is the last check that a call has a name and an
//! object-shaped arguments payload.

use tracing::{debug, warn};

use super::ids::CallIdAllocator;
use super::json;
use super::name_prefixed::NamePrefixedAssembler;
use super::structured::StructuredAssembler;
use super::tagged::TaggedAssembler;
use crate::core::profile::{DecoderProfile, ToolCallStrategy};
use crate::core::types::{AssembledToolCall, ToolCallFragment, Update};
use crate::utils::error::Result;

/// Validates and ids assembled calls before they reach the update stream
#[derive(Debug, Default)]
pub(crate) struct CallSink {
    ids: CallIdAllocator,
    emitted: usize,
}

impl CallSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Emit one call; returns `false` if it was rejected
    pub(crate) fn emit(
        &mut self,
        upstream_id: Option<&str>,
        name: &str,
        arguments: String,
        out: &mut Vec<Update>,
    ) -> bool {
        let name = name.trim();
        if name.is_empty() {
            warn!("rejecting tool call without a function name");
            return false;
        }
        if json::parse_object(&arguments).is_none() {
            warn!(tool = %name, "rejecting tool call whose arguments are not a JSON object");
            return false;
        }

        let id = self.ids.resolve(upstream_id);
        debug!(tool = %name, id = %id, "tool call assembled");
        out.push(Update::ToolCall(AssembledToolCall::new(id, name, arguments)));
        self.emitted += 1;
        true
    }

    pub(crate) fn emitted(&self) -> usize {
        self.emitted
    }
}

#[derive(Debug)]
enum StrategyState {
    Structured(StructuredAssembler),
    NamePrefixed(NamePrefixedAssembler),
    Tagged(TaggedAssembler),
}

/// Reassembles complete tool calls for one turn
#[derive(Debug)]
pub struct ToolCallAssembler {
    strategy: StrategyState,
    sink: CallSink,
}

impl ToolCallAssembler {
    pub fn for_profile(profile: &DecoderProfile) -> Result<Self> {
        let max_bytes = profile.max_tool_buffer_bytes;
        let strategy = match &profile.tool_calls {
            ToolCallStrategy::Structured => {
                StrategyState::Structured(StructuredAssembler::new(max_bytes))
            }
            ToolCallStrategy::NamePrefixed { candidates } => {
                StrategyState::NamePrefixed(NamePrefixedAssembler::new(candidates, max_bytes)?)
            }
            ToolCallStrategy::Tagged {
                open_tag,
                close_tag,
            } => StrategyState::Tagged(TaggedAssembler::new(
                open_tag.as_str(),
                close_tag.as_str(),
                max_bytes,
            )),
        };

        Ok(Self {
            strategy,
            sink: CallSink::new(),
        })
    }

    /// Visible text of one delta
    ///
    /// Text-borne strategies may hold it back, release it as `Answer`, or turn
    /// it into tool calls.
    pub fn push_text(&mut self, text: &str, out: &mut Vec<Update>) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        match &mut self.strategy {
            StrategyState::Structured(_) => {
                out.push(Update::Answer(text.to_string()));
                Ok(())
            }
            StrategyState::NamePrefixed(assembler) => {
                assembler.push_text(text, &mut self.sink, out)
            }
            StrategyState::Tagged(assembler) => assembler.push_text(text, &mut self.sink, out),
        }
    }

    /// Structured fragments of one delta
    pub fn push_fragments(
        &mut self,
        fragments: &[ToolCallFragment],
        out: &mut Vec<Update>,
    ) -> Result<()> {
        if fragments.is_empty() {
            return Ok(());
        }
        match &mut self.strategy {
            StrategyState::Structured(assembler) => {
                assembler.push_fragments(fragments, &mut self.sink, out)
            }
            _ => {
                debug!(
                    count = fragments.len(),
                    "ignoring structured tool call fragments for text-borne strategy"
                );
                Ok(())
            }
        }
    }

    /// Best-effort release of buffered calls on a `tool_calls` finish reason
    pub fn flush(&mut self, out: &mut Vec<Update>) {
        match &mut self.strategy {
            StrategyState::Structured(assembler) => assembler.flush(&mut self.sink, out),
            StrategyState::NamePrefixed(assembler) => assembler.flush(&mut self.sink, out),
            StrategyState::Tagged(assembler) => assembler.flush(&mut self.sink, out),
        }
    }

    /// End of stream; incomplete calls never become tool calls
    pub fn finish(&mut self, out: &mut Vec<Update>) {
        match &mut self.strategy {
            StrategyState::Structured(assembler) => assembler.finish(&mut self.sink, out),
            StrategyState::NamePrefixed(assembler) => assembler.finish(out),
            StrategyState::Tagged(assembler) => assembler.finish(out),
        }
    }

    /// The active strategy requires the turn to end now
    pub fn ends_turn(&self) -> bool {
        match &self.strategy {
            StrategyState::NamePrefixed(assembler) => assembler.is_complete(),
            _ => false,
        }
    }

    /// Number of calls emitted so far this turn
    pub fn emitted(&self) -> usize {
        self.sink.emitted()
    }

    pub fn strategy_label(&self) -> &'static str {
        match &self.strategy {
            StrategyState::Structured(_) => "structured",
            StrategyState::NamePrefixed(_) => "name_prefixed",
            StrategyState::Tagged(_) => "tagged",
        }
    }
}
