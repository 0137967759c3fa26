//! # turnstream
//!
//! Incremental decoder for OpenAI-compatible chat completion streams.
//!
//! ## Features
//!
//! - **SSE Frame Reader**: reassembles `data:` frames from arbitrarily split byte chunks
//! - **Reasoning Split**: separates reasoning text from the visible answer, with a one-time phase marker
//! - **Tool Calls**: structured fragments, name-prefixed text or `<tool_call>` blocks, per profile
//! - **Continuation**: re-issues the request after the caller appends tool results
//! - **Cancellation**: every turn observes a [`CancellationToken`](tokio_util::sync::CancellationToken)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use tokio_util::sync::CancellationToken;
//! use turnstream::{DecoderProfile, TransportResponse, TurnAssembler, Update};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let assembler = TurnAssembler::new(DecoderProfile::deepseek_reasoner())?;
//!     let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";
//!     let response = TransportResponse::from_chunks(200, vec![body]);
//!
//!     let mut updates = assembler.decode(response, CancellationToken::new());
//!     while let Some(update) = updates.next().await {
//!         match update? {
//!             Update::Thinking(text) => eprint!("{}", text),
//!             Update::Answer(text) => print!("{}", text),
//!             Update::PhaseMarker => println!(),
//!             Update::ToolCall(call) => println!("\n-> {}({})", call.name, call.arguments),
//!             Update::Terminal(reason) => println!("\n[{}]", reason),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use config::{DecoderConfig, Validate};
pub use core::completion::{ContinuationController, DEFAULT_MAX_CONTINUATIONS, should_continue};
pub use core::function_calling::ToolCallAssembler;
pub use core::profile::{DecoderProfile, PhaseMarkers, ToolCallStrategy};
pub use core::streaming::{
    ChatTransport, ChunkDecoder, SseFrameParser, TransportResponse, TurnAssembler, TurnState,
    UpdateStream,
};
pub use core::types::{
    AssembledToolCall, ChatMessage, Delta, FinishReason, MessageRole, SharedMessages, TurnResult,
    Update, Usage,
};
pub use utils::error::{DecodeError, Result};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
