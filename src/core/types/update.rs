//! Caller-facing update stream items

use serde::{Deserialize, Serialize};

use super::finish_reason::FinishReason;
use super::usage::Usage;

/// A fully reassembled function invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledToolCall {
    /// Server-supplied id, or one generated when the call was emitted
    pub id: String,

    /// Function name, never empty
    pub name: String,

    /// Arguments as a syntactically complete JSON object
    pub arguments: String,
}

impl AssembledToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the arguments text
    pub fn arguments_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.arguments)
    }
}

/// One item of the decoded update stream
///
/// Items arrive in strict emission order. A turn emits at most one
/// `PhaseMarker` and always ends with exactly one `Terminal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Update {
    /// Reasoning text
    Thinking(String),
    /// Visible answer text
    Answer(String),
    /// A complete tool invocation
    ToolCall(AssembledToolCall),
    /// Transition from reasoning output to answer output
    PhaseMarker,
    /// End of the turn
    Terminal(FinishReason),
}

impl Update {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

/// Fully assembled result of one turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// Concatenated answer text
    pub text: String,

    /// Concatenated reasoning text, if the model produced any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Tool calls in emission order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<AssembledToolCall>,

    /// Final completion reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Usage statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Model that served the turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl TurnResult {
    /// Fold one update into the result
    pub fn apply(&mut self, update: Update) {
        match update {
            Update::Thinking(text) => {
                if !text.is_empty() {
                    self.reasoning.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Update::Answer(text) => self.text.push_str(&text),
            Update::ToolCall(call) => self.tool_calls.push(call),
            Update::PhaseMarker => {}
            Update::Terminal(reason) => self.finish_reason = Some(reason),
        }
    }

    /// Build a result from an ordered update sequence
    pub fn from_updates(updates: impl IntoIterator<Item = Update>) -> Self {
        let mut result = Self::default();
        for update in updates {
            result.apply(update);
        }
        result
    }
}
