//! Decoding responses read over HTTP

#[cfg(test)]
mod tests {
    use crate::common::fixtures::weather_call_turn;
    use crate::common::{HttpTransport, UpdateAssertions, decode_all, decode_results};
    use turnstream::{
        ChatMessage, ChatTransport, DecodeError, DecoderProfile, FinishReason, TurnAssembler,
    };
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse(body: String) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("cache-control", "no-cache")
            .set_body_raw(body, "text/event-stream")
    }

    #[tokio::test]
    async fn test_streamed_call_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(sse(weather_call_turn().build()))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri());
        let response = transport
            .send(&[ChatMessage::user("Weather in NYC?")])
            .await
            .unwrap();
        assert!(response.is_success());

        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let updates = decode_all(&assembler, response).await;

        assert_eq!(updates.tool_calls().len(), 1);
        updates.assert_tool_calls_well_formed();
        updates.assert_terminated_with(FinishReason::ToolCalls);
    }

    #[tokio::test]
    async fn test_rejected_request_carries_server_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid API key", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri());
        let response = transport.send(&[ChatMessage::user("hi")]).await.unwrap();

        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        let results = decode_results(&assembler, response).await;

        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(DecodeError::Transport { status, message }) => {
                assert_eq!(*status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("expected a transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri());
        let response = transport.send(&[ChatMessage::user("hi")]).await.unwrap();
        let err = response.into_error().await;

        assert_eq!(err.status(), Some(502));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_network_error() {
        // Nothing listens on port 1
        let transport = HttpTransport::new("http://127.0.0.1:1");
        let err = transport.send(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, DecodeError::Network { .. }));
    }
}
