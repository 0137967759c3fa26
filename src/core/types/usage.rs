//! Token usage reported by the server

use serde::{Deserialize, Serialize};

/// Usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt token count
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Completion token count
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total token count
    #[serde(default)]
    pub total_tokens: u32,

    /// Reasoning tokens, when the server breaks them out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
}

impl Usage {
    /// Read usage from an OpenAI-style `usage` object
    ///
    /// Reasoning tokens may live under `completion_tokens_details`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let count = |key: &str| {
            object
                .get(key)
                .and_then(|v| v.as_u64())
                .map(saturate)
        };

        let prompt_tokens = count("prompt_tokens").unwrap_or(0);
        let completion_tokens = count("completion_tokens").unwrap_or(0);
        let total_tokens = count("total_tokens")
            .unwrap_or_else(|| prompt_tokens.saturating_add(completion_tokens));
        let reasoning_tokens = count("reasoning_tokens").or_else(|| {
            value
                .pointer("/completion_tokens_details/reasoning_tokens")
                .and_then(|v| v.as_u64())
                .map(saturate)
        });

        Some(Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
            reasoning_tokens,
        })
    }
}

/// Counts past `u32::MAX` are pinned there rather than wrapped
fn saturate(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
