//! Continuation controller

use futures::StreamExt;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::streaming::{ChatTransport, TurnAssembler, UpdateStream};
use crate::core::types::{FinishReason, SharedMessages, Update};
use crate::utils::error::DecodeError;

/// Default bound on automatic follow-up turns
pub const DEFAULT_MAX_CONTINUATIONS: u32 = 8;

/// Whether a finished turn should be followed by another
///
/// True when the turn ended in `tool_calls`, the message list grew while the
/// turn was decoded, and the newest message is a tool result.
pub fn should_continue(
    reason: Option<&FinishReason>,
    len_before: usize,
    messages: &SharedMessages,
) -> bool {
    if !reason.is_some_and(FinishReason::is_tool_calls) {
        return false;
    }
    let messages = messages.read();
    messages.len() > len_before
        && messages
            .last()
            .is_some_and(|message| message.role.is_tool_result())
}

/// Runs turns back to back while the caller keeps answering tool calls
#[derive(Clone)]
pub struct ContinuationController {
    transport: Arc<dyn ChatTransport>,
    assembler: TurnAssembler,
    max_continuations: Option<u32>,
}

impl fmt::Debug for ContinuationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationController")
            .field("profile", &self.assembler.profile().name)
            .field("max_continuations", &self.max_continuations)
            .finish_non_exhaustive()
    }
}

impl ContinuationController {
    pub fn new(transport: Arc<dyn ChatTransport>, assembler: TurnAssembler) -> Self {
        Self {
            transport,
            assembler,
            max_continuations: Some(DEFAULT_MAX_CONTINUATIONS),
        }
    }

    /// `None` lets the loop run for as long as tool results keep arriving
    pub fn with_max_continuations(mut self, max_continuations: Option<u32>) -> Self {
        self.max_continuations = max_continuations;
        self
    }

    pub fn max_continuations(&self) -> Option<u32> {
        self.max_continuations
    }

    /// Stream every turn's updates, in order, for the shared message list
    ///
    /// Each turn ends with its own `Terminal`. Any error ends the stream; it is
    /// never retried or swallowed.
    pub fn run(&self, messages: SharedMessages, cancel: CancellationToken) -> UpdateStream {
        let this = self.clone();
        Box::pin(async_stream::stream! {
            let conversation = Uuid::new_v4();
            let mut turn: u32 = 1;

            loop {
                if cancel.is_cancelled() {
                    yield Err(DecodeError::cancelled("continuation"));
                    return;
                }

                let (len_before, snapshot) = {
                    let guard = messages.read();
                    (guard.len(), guard.clone())
                };
                debug!(%conversation, turn, messages = len_before, "issuing request");

                let response = match this.transport.send(&snapshot).await {
                    Ok(response) => response,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                let mut updates = this.assembler.decode_turn(response, cancel.clone(), turn);
                let mut final_reason = None;
                while let Some(update) = updates.next().await {
                    match update {
                        Ok(update) => {
                            if let Update::Terminal(reason) = &update {
                                final_reason = Some(reason.clone());
                            }
                            yield Ok(update);
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }

                if !should_continue(final_reason.as_ref(), len_before, &messages) {
                    debug!(%conversation, turn, "conversation settled");
                    return;
                }
                if let Some(max) = this.max_continuations {
                    if turn > max {
                        warn!(%conversation, max, "continuation limit reached; not answering further tool results");
                        return;
                    }
                }

                turn += 1;
                info!(%conversation, turn, "tool results appended; continuing");
            }
        })
    }
}
