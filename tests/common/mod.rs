//! Common test utilities for turnstream-rs
//!
//! - SSE body fixtures for each model family
//! - Helpers that drive a response through a [`TurnAssembler`]
//! - Assertions over decoded update sequences
//! - An HTTP transport for `wiremock`-backed tests

pub mod assertions;
pub mod fixtures;
pub mod http;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use turnstream::{DecodeError, TransportResponse, TurnAssembler, Update};

pub use assertions::UpdateAssertions;
pub use fixtures::SseBody;
pub use http::HttpTransport;

/// Decode a response, panicking on the first error
pub async fn decode_all(assembler: &TurnAssembler, response: TransportResponse) -> Vec<Update> {
    assembler
        .decode(response, CancellationToken::new())
        .map(|item| item.expect("decode failed"))
        .collect()
        .await
}

/// Decode a response, keeping errors in the sequence
pub async fn decode_results(
    assembler: &TurnAssembler,
    response: TransportResponse,
) -> Vec<Result<Update, DecodeError>> {
    assembler
        .decode(response, CancellationToken::new())
        .collect()
        .await
}
