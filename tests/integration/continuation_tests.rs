//! Continuation loop against an HTTP server

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{answer_turn, weather_call_turn};
    use crate::common::{HttpTransport, UpdateAssertions};
    use futures::StreamExt;
    use parking_lot::RwLock;
    use serde_json::Value;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use turnstream::{
        ChatMessage, ContinuationController, DecoderProfile, FinishReason, SharedMessages,
        TurnAssembler, Update,
    };
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Calls a tool until the conversation ends with a tool result
    struct WeatherModel;

    impl Respond for WeatherModel {
        fn respond(&self, req: &Request) -> ResponseTemplate {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or_default();
            let last_role = body["messages"]
                .as_array()
                .and_then(|messages| messages.last())
                .and_then(|message| message["role"].as_str())
                .unwrap_or_default()
                .to_string();

            let sse = if last_role == "tool" {
                answer_turn("It is sunny in NYC.").build()
            } else {
                weather_call_turn().build()
            };
            ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream")
        }
    }

    async fn start() -> (MockServer, ContinuationController) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(WeatherModel)
            .mount(&server)
            .await;

        let transport = Arc::new(HttpTransport::new(&server.uri()));
        let assembler = TurnAssembler::new(DecoderProfile::openai()).unwrap();
        (server, ContinuationController::new(transport, assembler))
    }

    fn conversation() -> SharedMessages {
        Arc::new(RwLock::new(vec![
            ChatMessage::system("You can call get_weather."),
            ChatMessage::user("Weather in NYC?"),
        ]))
    }

    #[tokio::test]
    async fn test_loops_once_after_tool_result() {
        let (server, controller) = start().await;
        let messages = conversation();

        let mut stream = controller.run(messages.clone(), CancellationToken::new());
        let mut updates = Vec::new();
        while let Some(item) = stream.next().await {
            let update = item.unwrap();
            if let Update::ToolCall(call) = &update {
                let mut list = messages.write();
                list.push(ChatMessage::assistant_tool_calls(vec![call.clone()]));
                list.push(ChatMessage::tool(call.id.clone(), "{\"forecast\":\"sunny\"}"));
            }
            updates.push(update);
        }

        let terminals: Vec<&Update> = updates.iter().filter(|u| u.is_terminal()).collect();
        assert_eq!(
            terminals,
            vec![
                &Update::Terminal(FinishReason::ToolCalls),
                &Update::Terminal(FinishReason::Stop)
            ]
        );
        assert_eq!(updates.answer_text(), "It is sunny in NYC.");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(second["messages"].as_array().map(Vec::len), Some(4));
        assert_eq!(second["messages"][3]["tool_call_id"], "call_x");
    }

    #[tokio::test]
    async fn test_does_not_loop_without_tool_result() {
        let (server, controller) = start().await;

        let updates: Vec<Update> = controller
            .run(conversation(), CancellationToken::new())
            .map(|item| item.unwrap())
            .collect()
            .await;

        updates.assert_terminated_with(FinishReason::ToolCalls);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
