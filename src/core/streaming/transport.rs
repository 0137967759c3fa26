//! Transport seam
//!
//! The decoder never opens connections. It consumes a [`TransportResponse`]
//! (status plus body stream) produced by whatever HTTP stack the caller uses,
//! and the continuation controller asks a [`ChatTransport`] for new ones.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use super::sse::ByteStream;
use crate::core::types::ChatMessage;
use crate::utils::error::{DecodeError, Result};

/// Upper bound on how much of an error body is read for its detail
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// An open response: status already known, body not yet read
pub struct TransportResponse {
    status: u16,
    body: ByteStream,
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl TransportResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    pub fn ok(body: ByteStream) -> Self {
        Self::new(200, body)
    }

    /// Response whose body is the given chunks, in order
    pub fn from_chunks<I, B>(status: u16, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<Result<Bytes>> = chunks.into_iter().map(|c| Ok(c.into())).collect();
        Self::new(status, stream::iter(chunks).boxed())
    }

    /// Adapt a `reqwest` response
    pub fn from_reqwest(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(DecodeError::from))
            .boxed();
        Self::new(status, body)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_body(self) -> ByteStream {
        self.body
    }

    /// Read the (bounded) body of a failed response into a transport error
    pub async fn into_error(mut self) -> DecodeError {
        let mut raw = Vec::new();
        while let Some(chunk) = self.body.next().await {
            match chunk {
                Ok(bytes) => {
                    raw.extend_from_slice(&bytes);
                    if raw.len() >= MAX_ERROR_BODY_BYTES {
                        raw.truncate(MAX_ERROR_BODY_BYTES);
                        break;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "failed reading error body");
                    break;
                }
            }
        }

        let text = String::from_utf8_lossy(&raw);
        let message = server_error_detail(&text).unwrap_or_else(|| {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", self.status)
            } else {
                trimmed.to_string()
            }
        });
        DecodeError::transport(self.status, message)
    }
}

/// Pull the human-readable detail out of a JSON error body
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}`,
/// `{"detail": ..}` and `{"message": ..}`.
pub fn server_error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;

    let detail = value
        .pointer("/error/message")
        .or_else(|| value.get("error").filter(|e| e.is_string()))
        .or_else(|| value.get("detail"))
        .or_else(|| value.get("message"))?;

    match detail {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Issues one chat request for the current message list
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, messages: &[ChatMessage]) -> Result<TransportResponse>;
}
