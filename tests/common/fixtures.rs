//! Test fixtures
//!
//! Builders for `chat.completion.chunk` payloads and the SSE bodies that carry
//! them. Everything produced here is what a real server sends on the wire.

use serde_json::{Value, json};
use turnstream::TransportResponse;

/// Builder for a streamed response body
#[derive(Debug, Default, Clone)]
pub struct SseBody {
    lines: Vec<String>,
    done: bool,
}

impl SseBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `data:` event carrying `payload`
    pub fn event(mut self, payload: Value) -> Self {
        self.lines.push(format!("data: {}\n\n", payload));
        self
    }

    /// Append a raw line, terminated as an event
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(format!("{}\n\n", line));
        self
    }

    pub fn content(self, text: &str) -> Self {
        self.event(chunk(json!({ "content": text }), None))
    }

    pub fn reasoning(self, text: &str) -> Self {
        self.event(chunk(json!({ "reasoning_content": text }), None))
    }

    /// Structured tool call fragment; `None` fields are left off the wire
    pub fn tool_fragment(
        self,
        index: u32,
        id: Option<&str>,
        name: Option<&str>,
        arguments: &str,
    ) -> Self {
        let mut function = json!({ "arguments": arguments });
        if let Some(name) = name {
            function["name"] = json!(name);
        }
        let mut call = json!({ "index": index, "type": "function", "function": function });
        if let Some(id) = id {
            call["id"] = json!(id);
        }
        self.event(chunk(json!({ "tool_calls": [call] }), None))
    }

    pub fn finish(self, reason: &str) -> Self {
        self.event(chunk(json!({}), Some(reason)))
    }

    pub fn usage(self, prompt: u32, completion: u32) -> Self {
        self.event(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion.chunk",
            "model": "test-model",
            "choices": [],
            "usage": {
                "prompt_tokens": prompt,
                "completion_tokens": completion,
                "total_tokens": prompt + completion
            }
        }))
    }

    pub fn done(mut self) -> Self {
        self.done = true;
        self
    }

    pub fn build(&self) -> String {
        let mut body = self.lines.concat();
        if self.done {
            body.push_str("data: [DONE]\n\n");
        }
        body
    }

    /// The body delivered in one chunk
    pub fn response(&self) -> TransportResponse {
        TransportResponse::from_chunks(200, vec![self.build()])
    }

    /// The body cut every `size` bytes, ignoring line and UTF-8 boundaries
    pub fn split_response(&self, size: usize) -> TransportResponse {
        TransportResponse::from_chunks(200, split_bytes(self.build().as_bytes(), size))
    }
}

/// One `chat.completion.chunk` payload
pub fn chunk(delta: Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "delta": delta,
            "finish_reason": finish_reason
        }]
    })
}

pub fn split_bytes(bytes: &[u8], size: usize) -> Vec<Vec<u8>> {
    bytes.chunks(size.max(1)).map(<[u8]>::to_vec).collect()
}

/// Scenario: reasoning fragments, then the answer
pub fn arithmetic_turn() -> SseBody {
    SseBody::new()
        .reasoning("The user asks")
        .reasoning(" for 2+2.")
        .event(chunk(json!({ "content": "4" }), Some("stop")))
        .done()
}

/// Scenario: one structured call, arguments split over two fragments
pub fn weather_call_turn() -> SseBody {
    SseBody::new()
        .tool_fragment(0, Some("call_x"), Some("get_weather"), "")
        .tool_fragment(0, Some("call_x"), None, "{\"city\":")
        .tool_fragment(0, Some("call_x"), None, "\"NYC\"}")
        .finish("tool_calls")
        .done()
}

pub fn answer_turn(text: &str) -> SseBody {
    SseBody::new()
        .event(chunk(json!({ "content": text }), Some("stop")))
        .done()
}
