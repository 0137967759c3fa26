//! Decoded streaming increments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finish_reason::FinishReason;
use super::message::MessageRole;
use super::usage::Usage;

/// One decoded increment of a streamed response
///
/// Produced by the chunk decoder and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Role (usually only appears in first chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,

    /// Visible answer text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Reasoning text from whichever reasoning field the profile reads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Tool call fragments, in wire order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallFragment>,

    /// Completion reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Model that produced the chunk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Server timestamp, or decode time when the server sent none
    pub created_at: DateTime<Utc>,

    /// Usage statistics (only in final chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Delta {
    /// Create an empty delta stamped with the current time
    pub fn new() -> Self {
        Self {
            role: None,
            text: None,
            reasoning: None,
            tool_calls: Vec::new(),
            finish_reason: None,
            model: None,
            created_at: Utc::now(),
            usage: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_tool_call(mut self, fragment: ToolCallFragment) -> Self {
        self.tool_calls.push(fragment);
        self
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    /// Non-empty visible text, if any
    pub fn visible_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Non-empty reasoning text, if any
    pub fn reasoning_text(&self) -> Option<&str> {
        self.reasoning.as_deref().filter(|t| !t.is_empty())
    }
}

impl Default for Delta {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial slice of one tool invocation
///
/// Fragments sharing an id (or, when the id is omitted, the same index or
/// simply the currently open call) concatenate into one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallFragment {
    /// Positional index on the wire
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    /// Call ID (only in first chunk for most servers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Function name piece
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Arguments piece
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl ToolCallFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }
}
