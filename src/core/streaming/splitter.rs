//! Reasoning/answer phase tracking

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::profile::PhaseMarkers;
use crate::core::types::Update;

/// Which channel the turn is currently producing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Thinking,
    Answering,
}

/// Splits a turn into its reasoning and answer segments
///
/// The flip to `Answering` happens once and emits the phase marker before
/// anything that belongs to the answer. Reasoning that arrives afterwards is
/// dropped.
#[derive(Debug, Clone)]
pub struct ReasoningSplitter {
    markers: PhaseMarkers,
    phase: Phase,
    marker_sent: bool,
}

impl ReasoningSplitter {
    pub fn new(markers: PhaseMarkers) -> Self {
        let phase = if markers.has_reasoning_channel() {
            Phase::Thinking
        } else {
            Phase::Answering
        };
        Self {
            markers,
            phase,
            marker_sent: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn marker_sent(&self) -> bool {
        self.marker_sent
    }

    /// Turn start
    pub fn open(&self, out: &mut Vec<Update>) {
        if self.markers == PhaseMarkers::OpenAndBoundary {
            out.push(Update::Thinking(String::new()));
        }
    }

    /// Reasoning text of one delta
    pub fn reasoning(&self, text: &str, out: &mut Vec<Update>) {
        match self.phase {
            Phase::Thinking => out.push(Update::Thinking(text.to_string())),
            Phase::Answering => {
                trace!(bytes = text.len(), "dropping reasoning after the answer started");
            }
        }
    }

    /// Flip to the answer phase if not already there
    pub fn enter_answer(&mut self, out: &mut Vec<Update>) {
        if self.phase == Phase::Answering {
            return;
        }
        self.phase = Phase::Answering;
        if !self.marker_sent {
            self.marker_sent = true;
            out.push(Update::PhaseMarker);
        }
    }
}
