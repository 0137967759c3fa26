//! Per-turn decoding state
//!
//! [`TurnState`] is everything one turn mutates between deltas. It is driven
//! synchronously, one delta at a time, so it can be tested without a stream.

use serde::{Deserialize, Serialize};
use tracing::{Span, debug, debug_span, warn};

use super::splitter::{Phase, ReasoningSplitter};
use crate::core::function_calling::ToolCallAssembler;
use crate::core::profile::DecoderProfile;
use crate::core::types::{Delta, FinishReason, Update, Usage};
use crate::utils::error::Result;

/// Lifecycle of one turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Start,
    Streaming,
    ToolCallsPending,
    Done,
    Failed,
}

/// Mutable state owned by exactly one turn
#[derive(Debug)]
pub struct TurnState {
    status: TurnStatus,
    splitter: ReasoningSplitter,
    tools: ToolCallAssembler,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
    model: Option<String>,
    span: Span,
}

impl TurnState {
    pub fn new(profile: &DecoderProfile) -> Result<Self> {
        Self::with_turn(profile, 1)
    }

    /// State for the `turn`-th pass of a continued conversation
    pub fn with_turn(profile: &DecoderProfile, turn: u32) -> Result<Self> {
        let tools = ToolCallAssembler::for_profile(profile)?;
        let span = debug_span!(
            "turn",
            profile = %profile.name,
            turn,
            strategy = tools.strategy_label()
        );

        Ok(Self {
            status: TurnStatus::Start,
            splitter: ReasoningSplitter::new(profile.phase_markers),
            tools,
            finish_reason: None,
            usage: None,
            model: None,
            span,
        })
    }

    pub fn status(&self) -> TurnStatus {
        self.status
    }

    pub fn phase(&self) -> Phase {
        self.splitter.phase()
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Last finish reason reported by the server
    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.finish_reason.as_ref()
    }

    /// Number of tool calls emitted so far
    pub fn tool_calls_emitted(&self) -> usize {
        self.tools.emitted()
    }

    /// No further deltas will be consumed
    pub fn is_complete(&self) -> bool {
        matches!(self.status, TurnStatus::Done | TurnStatus::Failed) || self.tools.ends_turn()
    }

    /// Updates emitted when the turn opens
    pub fn start(&mut self) -> Vec<Update> {
        let mut out = Vec::new();
        if self.status == TurnStatus::Start {
            let _enter = self.span.enter();
            debug!("turn started");
            self.splitter.open(&mut out);
            self.status = TurnStatus::Streaming;
        }
        out
    }

    /// Feed one delta, returning its updates in emission order
    pub fn apply(&mut self, delta: Delta) -> Result<Vec<Update>> {
        let mut out = Vec::new();
        if self.status == TurnStatus::Start {
            out = self.start();
        }
        if matches!(self.status, TurnStatus::Done | TurnStatus::Failed) {
            return Ok(out);
        }
        let span = self.span.clone();
        let _enter = span.enter();

        if let Some(model) = &delta.model {
            self.model = Some(model.clone());
        }
        if let Some(usage) = delta.usage.clone() {
            self.usage = Some(usage);
        }

        if let Some(reasoning) = delta.reasoning_text() {
            self.splitter.reasoning(reasoning, &mut out);
        }

        let mut produced = Vec::new();
        let step = self.feed_tools(&delta, &mut produced);
        if let Err(e) = step {
            warn!(error = %e, "turn failed");
            self.status = TurnStatus::Failed;
            return Err(e);
        }

        // Visible text starts the answer even while a text-borne strategy holds it
        if delta.visible_text().is_some() || !produced.is_empty() {
            self.splitter.enter_answer(&mut out);
        }
        out.extend(produced);
        Ok(out)
    }

    fn feed_tools(&mut self, delta: &Delta, produced: &mut Vec<Update>) -> Result<()> {
        if let Some(text) = delta.visible_text() {
            self.tools.push_text(text, produced)?;
        }
        self.tools.push_fragments(&delta.tool_calls, produced)?;

        if let Some(reason) = &delta.finish_reason {
            if reason.is_tool_calls() {
                debug!("tool_calls finish reason; flushing buffered calls");
                self.status = TurnStatus::ToolCallsPending;
                self.tools.flush(produced);
            }
            self.finish_reason = Some(reason.clone());
        }
        Ok(())
    }

    /// End the turn: release held text, close the phase, emit `Terminal`
    ///
    /// Calling this twice emits nothing the second time.
    pub fn finish(&mut self) -> Vec<Update> {
        let mut out = Vec::new();
        if matches!(self.status, TurnStatus::Done | TurnStatus::Failed) {
            return out;
        }
        if self.status == TurnStatus::Start {
            out = self.start();
        }
        let _enter = self.span.enter();

        let mut produced = Vec::new();
        self.tools.finish(&mut produced);
        self.splitter.enter_answer(&mut out);
        out.extend(produced);

        let emitted = self.tools.emitted();
        let reason = match self.finish_reason.take() {
            Some(FinishReason::Stop) | None if emitted > 0 => FinishReason::ToolCalls,
            Some(reason) => reason,
            None => FinishReason::Stop,
        };
        debug!(reason = %reason, tool_calls = emitted, "turn finished");

        self.finish_reason = Some(reason.clone());
        self.status = TurnStatus::Done;
        out.push(Update::Terminal(reason));
        out
    }

    /// Mark the turn failed; `finish` becomes a no-op
    pub fn fail(&mut self) {
        self.status = TurnStatus::Failed;
    }
}
