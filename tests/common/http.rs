//! A real HTTP transport, pointed at a `wiremock` server in tests

use async_trait::async_trait;
use serde_json::json;
use turnstream::{ChatMessage, ChatTransport, Result, TransportResponse};

pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/v1/chat/completions", base_url),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, messages: &[ChatMessage]) -> Result<TransportResponse> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "model": "test-model",
                "stream": true,
                "messages": messages,
            }))
            .send()
            .await?;
        Ok(TransportResponse::from_reqwest(response))
    }
}
