//! Custom test assertions
//!
//! Checks that hold for every decoded turn, phrased over `[Update]`.

use std::collections::HashSet;
use turnstream::{AssembledToolCall, FinishReason, Update};

pub trait UpdateAssertions {
    /// Exactly one `Terminal`, and it is the last item
    fn assert_terminated_with(&self, reason: FinishReason);

    /// Number of phase markers
    fn phase_markers(&self) -> usize;

    fn tool_calls(&self) -> Vec<&AssembledToolCall>;

    /// Concatenated answer text
    fn answer_text(&self) -> String;

    /// Concatenated reasoning text
    fn thinking_text(&self) -> String;

    /// No call emitted twice, none with an empty name or unparsable arguments
    fn assert_tool_calls_well_formed(&self);
}

impl UpdateAssertions for [Update] {
    fn assert_terminated_with(&self, reason: FinishReason) {
        let terminals = self.iter().filter(|u| u.is_terminal()).count();
        assert_eq!(terminals, 1, "expected one Terminal, got {}: {:?}", terminals, self);
        assert_eq!(self.last(), Some(&Update::Terminal(reason)));
    }

    fn phase_markers(&self) -> usize {
        self.iter()
            .filter(|u| matches!(u, Update::PhaseMarker))
            .count()
    }

    fn tool_calls(&self) -> Vec<&AssembledToolCall> {
        self.iter()
            .filter_map(|u| match u {
                Update::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    fn answer_text(&self) -> String {
        self.iter()
            .filter_map(|u| match u {
                Update::Answer(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn thinking_text(&self) -> String {
        self.iter()
            .filter_map(|u| match u {
                Update::Thinking(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn assert_tool_calls_well_formed(&self) {
        let mut ids = HashSet::new();
        for call in self.tool_calls() {
            assert!(!call.name.is_empty(), "tool call without a name: {:?}", call);
            assert!(
                call.arguments_value().is_ok_and(|v| v.is_object()),
                "arguments are not a JSON object: {:?}",
                call
            );
            assert!(ids.insert(call.id.clone()), "tool call emitted twice: {:?}", call);
        }
    }
}
