//! Chunk decoder
//!
//! Parses one payload into a [`Delta`]. A payload that is not JSON, or that
//! carries no choices, is skipped rather than failing the turn; only an error
//! object reported by the server is fatal.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, trace};

use crate::core::profile::DecoderProfile;
use crate::core::types::{Delta, FinishReason, MessageRole, ToolCallFragment, Usage};
use crate::utils::error::{DecodeError, Result};

/// Decodes `chat.completion.chunk` payloads for one profile
#[derive(Debug, Clone)]
pub struct ChunkDecoder {
    reasoning_fields: Vec<String>,
}

impl ChunkDecoder {
    pub fn new(reasoning_fields: Vec<String>) -> Self {
        Self { reasoning_fields }
    }

    pub fn for_profile(profile: &DecoderProfile) -> Self {
        Self::new(profile.reasoning_fields.clone())
    }

    /// Decode one streamed payload
    ///
    /// `Ok(None)` means the payload was skipped.
    pub fn decode(&self, payload: &str) -> Result<Option<Delta>> {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, bytes = payload.len(), "skipping malformed chunk");
                return Ok(None);
            }
        };

        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            return Err(server_error(error));
        }

        let Some(choices) = value.get("choices").and_then(Value::as_array) else {
            debug!("skipping chunk without choices");
            return Ok(None);
        };

        let mut delta = self.envelope(&value);
        let Some(choice) = choices.first() else {
            // include_usage trailer
            if delta.usage.is_some() {
                return Ok(Some(delta));
            }
            trace!("skipping chunk with empty choices");
            return Ok(None);
        };

        if let Some(body) = choice.get("delta").filter(|d| d.is_object()) {
            self.read_message(body, &mut delta);
        }
        delta.finish_reason = finish_reason(choice);
        Ok(Some(delta))
    }

    /// Decode a complete `chat.completion` body into a single delta
    pub fn decode_completion(&self, body: &str) -> Result<Delta> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| DecodeError::response_parsing(format!("Invalid JSON body: {}", e)))?;

        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            return Err(server_error(error));
        }

        let choice = value
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .ok_or_else(|| DecodeError::response_parsing("No choices in response"))?;

        let mut delta = self.envelope(&value);
        let message = choice
            .get("message")
            .filter(|m| m.is_object())
            .ok_or_else(|| DecodeError::response_parsing("No message in choice"))?;
        self.read_message(message, &mut delta);
        delta.finish_reason = finish_reason(choice);
        Ok(delta)
    }

    /// Fields that live outside the choices
    fn envelope(&self, value: &Value) -> Delta {
        let mut delta = Delta::new();
        delta.model = value
            .get("model")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        if let Some(created) = value
            .get("created")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        {
            delta.created_at = created;
        }
        delta.usage = value.get("usage").and_then(Usage::from_value);
        delta
    }

    /// Read a `delta` or `message` object
    fn read_message(&self, body: &Value, delta: &mut Delta) {
        delta.role = body
            .get("role")
            .and_then(Value::as_str)
            .and_then(MessageRole::from_wire);

        delta.text = body
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string);

        delta.reasoning = self
            .reasoning_fields
            .iter()
            .filter_map(|field| body.get(field).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .map(str::to_string);

        if let Some(calls) = body.get("tool_calls").and_then(Value::as_array) {
            delta.tool_calls = calls.iter().map(read_fragment).collect();
        }

        // Legacy single function call
        if let Some(call) = body.get("function_call").filter(|c| c.is_object()) {
            let mut fragment = ToolCallFragment::new();
            fragment.name = call.get("name").and_then(Value::as_str).map(str::to_string);
            fragment.arguments = call.get("arguments").map(arguments_text);
            delta.tool_calls.push(fragment);
        }
    }
}

fn read_fragment(call: &Value) -> ToolCallFragment {
    let function = call.get("function");
    ToolCallFragment {
        index: call
            .get("index")
            .and_then(Value::as_u64)
            .and_then(|index| u32::try_from(index).ok()),
        id: call.get("id").and_then(Value::as_str).map(str::to_string),
        name: function
            .and_then(|f| f.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        arguments: function.and_then(|f| f.get("arguments")).map(arguments_text),
    }
}

/// Arguments arrive as text; some servers send a ready object instead
fn arguments_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn finish_reason(choice: &Value) -> Option<FinishReason> {
    choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .filter(|reason| !reason.is_empty())
        .map(FinishReason::from_wire)
}

/// Map a server `error` object to a transport error
pub(crate) fn server_error(error: &Value) -> DecodeError {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());

    let status = error
        .get("code")
        .or_else(|| error.get("status"))
        .and_then(|code| match code {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .filter(|code| (400..=599).contains(code))
        .map(|code| code as u16)
        .unwrap_or(500);

    DecodeError::transport(status, message)
}
