//! End-to-end decoding of single turns

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{arithmetic_turn, chunk, weather_call_turn};
    use crate::common::{SseBody, UpdateAssertions, decode_all, decode_results};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use turnstream::{
        DecodeError, DecoderProfile, FinishReason, PhaseMarkers, TransportResponse,
        TurnAssembler, Update,
    };

    fn boundary_profile() -> DecoderProfile {
        DecoderProfile {
            name: "boundary".to_string(),
            phase_markers: PhaseMarkers::Boundary,
            ..DecoderProfile::openai()
        }
    }

    // ==================== Reasoning split ====================

    #[tokio::test]
    async fn test_reasoning_then_answer() {
        let assembler = TurnAssembler::new(boundary_profile()).unwrap();
        let updates = decode_all(&assembler, arithmetic_turn().response()).await;

        assert_eq!(
            updates,
            vec![
                Update::Thinking("The user asks".to_string()),
                Update::Thinking(" for 2+2.".to_string()),
                Update::PhaseMarker,
                Update::Answer("4".to_string()),
                Update::Terminal(FinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn test_reasoner_opens_with_empty_thinking() {
        let assembler = TurnAssembler::new(DecoderProfile::deepseek_reasoner()).unwrap();
        let updates = decode_all(&assembler, arithmetic_turn().response()).await;

        assert_eq!(updates.first(), Some(&Update::Thinking(String::new())));
        assert_eq!(updates.phase_markers(), 1);
        assert_eq!(updates.thinking_text(), "The user asks for 2+2.");
        assert_eq!(updates.answer_text(), "4");
        updates.assert_terminated_with(FinishReason::Stop);
    }

    #[tokio::test]
    async fn test_no_marker_without_reasoning_channel() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let updates = decode_all(&assembler, arithmetic_turn().response()).await;

        assert_eq!(updates.phase_markers(), 0);
        assert_eq!(updates.answer_text(), "4");
    }

    #[tokio::test]
    async fn test_one_marker_at_every_split() {
        let assembler = TurnAssembler::new(boundary_profile()).unwrap();
        let body = SseBody::new()
            .reasoning("Überlegung…")
            .content("Die Antwort ist ")
            .content("vier.")
            .finish("stop")
            .done();

        for size in 1..=16 {
            let updates = decode_all(&assembler, body.split_response(size)).await;
            assert_eq!(updates.phase_markers(), 1, "split size {}", size);
            assert_eq!(updates.thinking_text(), "Überlegung…", "split size {}", size);
            assert_eq!(updates.answer_text(), "Die Antwort ist vier.", "split size {}", size);
            updates.assert_terminated_with(FinishReason::Stop);
        }
    }

    // ==================== Structured tool calls ====================

    #[tokio::test]
    async fn test_weather_call() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let updates = decode_all(&assembler, weather_call_turn().response()).await;

        let calls = updates.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_x");
        assert_eq!(calls[0].name, "get_weather");
        assert_eq!(calls[0].arguments_value().unwrap(), json!({ "city": "NYC" }));
        updates.assert_terminated_with(FinishReason::ToolCalls);
    }

    #[tokio::test]
    async fn test_weather_call_at_every_split() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let body = weather_call_turn();

        for size in [1, 2, 3, 5, 7, 11, 64] {
            let updates = decode_all(&assembler, body.split_response(size)).await;
            assert_eq!(updates.tool_calls().len(), 1, "split size {}", size);
            updates.assert_tool_calls_well_formed();
        }
    }

    #[tokio::test]
    async fn test_brace_inside_string_completes_once() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let body = SseBody::new()
            .tool_fragment(0, Some("call_a"), Some("note"), "{\"a\":\"")
            .tool_fragment(0, None, None, "}\"}")
            .finish("tool_calls")
            .done();

        let updates = decode_all(&assembler, body.response()).await;
        let calls = updates.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments_value().unwrap(), json!({ "a": "}" }));
    }

    #[tokio::test]
    async fn test_parallel_calls() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let body = SseBody::new()
            .tool_fragment(0, Some("call_1"), Some("search"), "{\"q\":")
            .tool_fragment(1, Some("call_2"), Some("lookup"), "{\"id\":7}")
            .tool_fragment(0, None, None, "\"rust\"}")
            .finish("tool_calls")
            .done();

        let updates = decode_all(&assembler, body.response()).await;
        updates.assert_tool_calls_well_formed();
        let names: Vec<&str> = updates.tool_calls().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["lookup", "search"]);
    }

    #[tokio::test]
    async fn test_tool_calls_with_stop_reason_are_reported_as_tool_calls() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let body = SseBody::new()
            .tool_fragment(0, Some("call_1"), Some("search"), "{}")
            .finish("stop")
            .done();

        let updates = decode_all(&assembler, body.response()).await;
        updates.assert_terminated_with(FinishReason::ToolCalls);
    }

    // ==================== Text-borne tool calls ====================

    #[tokio::test]
    async fn test_name_prefixed_call() {
        let profile = DecoderProfile::name_prefixed(["get_weather", "search"]);
        let assembler = TurnAssembler::new(profile).unwrap();
        let body = SseBody::new()
            .content("get_")
            .content("weather\n{\"city\": ")
            .content("\"Paris\"}")
            .content(" and some trailing chatter")
            .finish("stop")
            .done();

        let updates = decode_all(&assembler, body.response()).await;
        let calls = updates.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "get_weather");
        assert!(calls[0].id.starts_with("call_"));
        assert_eq!(updates.answer_text(), "");
        updates.assert_terminated_with(FinishReason::ToolCalls);
    }

    #[tokio::test]
    async fn test_name_prefixed_plain_answer() {
        let profile = DecoderProfile::name_prefixed(["get_weather"]);
        let assembler = TurnAssembler::new(profile).unwrap();
        let body = SseBody::new()
            .content("It is sunny ")
            .content("in Paris today.")
            .finish("stop")
            .done();

        let updates = decode_all(&assembler, body.response()).await;
        assert!(updates.tool_calls().is_empty());
        assert_eq!(updates.answer_text(), "It is sunny in Paris today.");
        updates.assert_terminated_with(FinishReason::Stop);
    }

    #[tokio::test]
    async fn test_tagged_call_after_reasoning() {
        let assembler = TurnAssembler::new(DecoderProfile::qwen_tagged()).unwrap();
        let body = SseBody::new()
            .reasoning("Need a search.")
            .content("Let me check.<tool_")
            .content("call>{\"name\": \"search\", \"arguments\": {\"q\": \"rust\"}}</tool_call>")
            .finish("stop")
            .done();

        let updates = decode_all(&assembler, body.response()).await;
        assert_eq!(updates.phase_markers(), 1);
        assert_eq!(updates.answer_text(), "Let me check.");
        let calls = updates.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "search");
        assert_eq!(calls[0].arguments_value().unwrap(), json!({ "q": "rust" }));
        updates.assert_terminated_with(FinishReason::ToolCalls);
    }

    // ==================== Robustness ====================

    #[tokio::test]
    async fn test_malformed_payload_between_valid_ones() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let body = SseBody::new()
            .content("Hello")
            .raw("data: {\"choices\": [{\"delta\": {\"content\": ")
            .raw(": keep-alive")
            .raw("event: ping")
            .content(", world")
            .finish("stop")
            .done();

        let updates = decode_all(&assembler, body.response()).await;
        assert_eq!(updates.answer_text(), "Hello, world");
        updates.assert_terminated_with(FinishReason::Stop);
    }

    #[tokio::test]
    async fn test_missing_done_still_terminates() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let body = SseBody::new().content("partial");

        let updates = decode_all(&assembler, body.response()).await;
        assert_eq!(updates.answer_text(), "partial");
        updates.assert_terminated_with(FinishReason::Stop);
    }

    #[tokio::test]
    async fn test_length_finish_reason() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let body = SseBody::new()
            .event(chunk(json!({ "content": "cut" }), Some("length")))
            .done();

        let updates = decode_all(&assembler, body.response()).await;
        updates.assert_terminated_with(FinishReason::Length);
    }

    #[tokio::test]
    async fn test_server_error_mid_stream() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let body = SseBody::new()
            .content("Hel")
            .event(json!({ "error": { "message": "overloaded", "code": 529 } }))
            .content("lo")
            .done();

        let results = decode_results(&assembler, body.response()).await;
        assert_eq!(results.len(), 2);
        assert!(matches!(&results[0], Ok(Update::Answer(text)) if text == "Hel"));
        assert!(matches!(
            &results[1],
            Err(DecodeError::Transport { status: 529, message }) if message.contains("overloaded")
        ));
    }

    #[tokio::test]
    async fn test_collected_turn_result() {
        let assembler = TurnAssembler::new(DecoderProfile::deepseek_reasoner()).unwrap();
        let body = SseBody::new()
            .reasoning("thinking")
            .content("done")
            .finish("stop")
            .usage(12, 3)
            .done();

        let result = assembler
            .complete(body.split_response(9), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.text, "done");
        assert_eq!(result.reasoning.as_deref(), Some("thinking"));
        assert_eq!(result.finish_reason, Some(FinishReason::Stop));
        assert_eq!(result.usage.map(|u| u.total_tokens), Some(15));
        assert_eq!(result.model.as_deref(), Some("test-model"));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_read() {
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let response = TransportResponse::from_chunks(200, vec![arithmetic_turn().build()]);
        let result = assembler.complete(response, cancel).await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
