//! Decoder profiles
//!
//! A profile captures everything that differs between model families:
//! - which delta fields carry reasoning text
//! - how tool calls are encoded (structured fragments, name-prefixed text, tagged blocks)
//! - whether and how the reasoning/answer phase marker is emitted
//!
//! One decoder handles every family; the profile is the only thing that varies.

use serde::{Deserialize, Serialize};

/// Default upper bound for a single tool call's argument buffer
pub const DEFAULT_MAX_TOOL_BUFFER_BYTES: usize = 1_048_576; // 1 MB

/// Default tags for inline tool call blocks
pub const DEFAULT_OPEN_TAG: &str = "<tool_call>";
pub const DEFAULT_CLOSE_TAG: &str = "</tool_call>";

/// Tool call encoding used by a model family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolCallStrategy {
    /// OpenAI-style `tool_calls` fragments in the delta
    Structured,
    /// Function name as a bare text token, followed by JSON arguments as text
    NamePrefixed {
        /// Function names the model may call
        #[serde(default)]
        candidates: Vec<String>,
    },
    /// Calls embedded in the text as `<tag>{...}</tag>` blocks
    Tagged {
        #[serde(default = "default_open_tag")]
        open_tag: String,
        #[serde(default = "default_close_tag")]
        close_tag: String,
    },
}

fn default_open_tag() -> String {
    DEFAULT_OPEN_TAG.to_string()
}

fn default_close_tag() -> String {
    DEFAULT_CLOSE_TAG.to_string()
}

impl ToolCallStrategy {
    pub fn tagged() -> Self {
        Self::Tagged {
            open_tag: default_open_tag(),
            close_tag: default_close_tag(),
        }
    }

    pub fn name_prefixed<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NamePrefixed {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::NamePrefixed { .. } => "name_prefixed",
            Self::Tagged { .. } => "tagged",
        }
    }
}

/// Phase marker behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseMarkers {
    /// No reasoning channel: the turn starts answering, no marker is emitted
    #[default]
    Never,
    /// Start in the thinking phase, emit the boundary marker once
    Boundary,
    /// Like `Boundary`, plus an empty `Thinking` update when the turn opens
    OpenAndBoundary,
}

impl PhaseMarkers {
    pub fn has_reasoning_channel(&self) -> bool {
        !matches!(self, Self::Never)
    }
}

/// Decoder profile for one model family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderProfile {
    /// Profile name, used in logs
    pub name: String,

    /// Delta fields read as reasoning text, first non-empty wins
    #[serde(default = "default_reasoning_fields")]
    pub reasoning_fields: Vec<String>,

    /// Tool call encoding
    #[serde(default = "default_strategy")]
    pub tool_calls: ToolCallStrategy,

    /// Phase marker behaviour
    #[serde(default)]
    pub phase_markers: PhaseMarkers,

    /// Upper bound on one tool call's buffered arguments
    #[serde(default = "default_max_tool_buffer_bytes")]
    pub max_tool_buffer_bytes: usize,
}

fn default_reasoning_fields() -> Vec<String> {
    vec!["reasoning_content".to_string(), "reasoning".to_string()]
}

fn default_strategy() -> ToolCallStrategy {
    ToolCallStrategy::Structured
}

fn default_max_tool_buffer_bytes() -> usize {
    DEFAULT_MAX_TOOL_BUFFER_BYTES
}

impl Default for DecoderProfile {
    fn default() -> Self {
        Self::openai()
    }
}

impl DecoderProfile {
    /// Plain OpenAI-compatible chat model: structured tool calls, no reasoning
    pub fn openai() -> Self {
        Self {
            name: "openai".to_string(),
            reasoning_fields: default_reasoning_fields(),
            tool_calls: ToolCallStrategy::Structured,
            phase_markers: PhaseMarkers::Never,
            max_tool_buffer_bytes: DEFAULT_MAX_TOOL_BUFFER_BYTES,
        }
    }

    /// DeepSeek-R1 style reasoner: `reasoning_content` channel, structured tool calls
    pub fn deepseek_reasoner() -> Self {
        Self {
            name: "deepseek-reasoner".to_string(),
            reasoning_fields: vec!["reasoning_content".to_string()],
            tool_calls: ToolCallStrategy::Structured,
            phase_markers: PhaseMarkers::OpenAndBoundary,
            max_tool_buffer_bytes: DEFAULT_MAX_TOOL_BUFFER_BYTES,
        }
    }

    /// Qwen/Hermes style: reasoning channel, `<tool_call>` blocks in the text
    pub fn qwen_tagged() -> Self {
        Self {
            name: "qwen-tagged".to_string(),
            reasoning_fields: default_reasoning_fields(),
            tool_calls: ToolCallStrategy::tagged(),
            phase_markers: PhaseMarkers::Boundary,
            max_tool_buffer_bytes: DEFAULT_MAX_TOOL_BUFFER_BYTES,
        }
    }

    /// Function name emitted as a text token, arguments following as text
    pub fn name_prefixed<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "name-prefixed".to_string(),
            reasoning_fields: default_reasoning_fields(),
            tool_calls: ToolCallStrategy::name_prefixed(candidates),
            phase_markers: PhaseMarkers::Never,
            max_tool_buffer_bytes: DEFAULT_MAX_TOOL_BUFFER_BYTES,
        }
    }

    /// Look up a built-in profile by name
    ///
    /// `candidates` only matters for the name-prefixed family.
    pub fn preset(name: &str, candidates: &[String]) -> Option<Self> {
        match name {
            "openai" => Some(Self::openai()),
            "deepseek-reasoner" | "deepseek-r1" => Some(Self::deepseek_reasoner()),
            "qwen-tagged" | "hermes" => Some(Self::qwen_tagged()),
            "name-prefixed" => Some(Self::name_prefixed(candidates.iter().cloned())),
            _ => None,
        }
    }

    /// Names accepted by [`DecoderProfile::preset`]
    pub fn preset_names() -> &'static [&'static str] {
        &["openai", "deepseek-reasoner", "qwen-tagged", "name-prefixed"]
    }

    /// Replace the candidate list of a name-prefixed profile
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let ToolCallStrategy::NamePrefixed { candidates: current } = &mut self.tool_calls {
            *current = candidates.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Profile name cannot be empty".to_string());
        }

        if self.max_tool_buffer_bytes == 0 {
            return Err(format!(
                "Profile '{}': max_tool_buffer_bytes must be greater than 0",
                self.name
            ));
        }

        if self.phase_markers.has_reasoning_channel() && self.reasoning_fields.is_empty() {
            return Err(format!(
                "Profile '{}' has a reasoning phase but no reasoning fields",
                self.name
            ));
        }

        match &self.tool_calls {
            ToolCallStrategy::Structured => {}
            ToolCallStrategy::NamePrefixed { candidates } => {
                if candidates.iter().any(|c| c.trim().is_empty()) {
                    return Err(format!(
                        "Profile '{}': candidate function names cannot be empty",
                        self.name
                    ));
                }
            }
            ToolCallStrategy::Tagged { open_tag, close_tag } => {
                if open_tag.is_empty() || close_tag.is_empty() {
                    return Err(format!(
                        "Profile '{}': tool call tags cannot be empty",
                        self.name
                    ));
                }
                if open_tag == close_tag {
                    return Err(format!(
                        "Profile '{}': open and close tags must differ",
                        self.name
                    ));
                }
            }
        }

        Ok(())
    }
}
