//! Turn assembler
//!
//! Drives the frame reader, chunk decoder and [`TurnState`] over one response,
//! either as a lazy update stream or collected into a [`TurnResult`].

use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::decoder::ChunkDecoder;
use super::sse::frames;
use super::transport::TransportResponse;
use super::turn::TurnState;
use crate::core::function_calling::ToolCallAssembler;
use crate::core::profile::DecoderProfile;
use crate::core::types::{TurnResult, Update};
use crate::utils::error::{DecodeError, Result};

/// Stream of updates for one or more turns
pub type UpdateStream = BoxStream<'static, Result<Update>>;

/// Decodes responses for one profile
///
/// Cheap to clone; every decoded turn gets its own [`TurnState`].
#[derive(Debug, Clone)]
pub struct TurnAssembler {
    profile: Arc<DecoderProfile>,
    decoder: ChunkDecoder,
}

impl TurnAssembler {
    pub fn new(profile: DecoderProfile) -> Result<Self> {
        profile.validate().map_err(DecodeError::configuration)?;
        // Fail on a bad candidate list now rather than on the first turn
        ToolCallAssembler::for_profile(&profile)?;

        Ok(Self {
            decoder: ChunkDecoder::for_profile(&profile),
            profile: Arc::new(profile),
        })
    }

    pub fn profile(&self) -> &DecoderProfile {
        &self.profile
    }

    /// Decode one streamed response into updates
    ///
    /// The stream ends after `Terminal`, or after the first error. A
    /// non-success response yields a single [`DecodeError::Transport`].
    pub fn decode(&self, response: TransportResponse, cancel: CancellationToken) -> UpdateStream {
        self.decode_turn(response, cancel, 1)
    }

    pub(crate) fn decode_turn(
        &self,
        response: TransportResponse,
        cancel: CancellationToken,
        turn: u32,
    ) -> UpdateStream {
        let assembler = self.clone();
        Box::pin(async_stream::stream! {
            let mut driver = match TurnDriver::open(&assembler, response, cancel, turn).await {
                Ok(driver) => driver,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            while let Some(batch) = driver.next_batch().await {
                match batch {
                    Ok(updates) => {
                        for update in updates {
                            yield Ok(update);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        })
    }

    /// Decode a streamed response without intermediate emission
    pub async fn complete(
        &self,
        response: TransportResponse,
        cancel: CancellationToken,
    ) -> Result<TurnResult> {
        let mut driver = TurnDriver::open(self, response, cancel, 1).await?;
        let mut result = TurnResult::default();

        while let Some(batch) = driver.next_batch().await {
            for update in batch? {
                result.apply(update);
            }
        }

        result.usage = driver.state.usage().cloned();
        result.model = driver.state.model().map(str::to_string);
        Ok(result)
    }

    /// Decode a complete (non-streamed) `chat.completion` body
    pub fn decode_body(&self, body: &str) -> Result<TurnResult> {
        let mut state = TurnState::new(&self.profile)?;
        let delta = self.decoder.decode_completion(body)?;

        let mut updates = state.start();
        updates.extend(state.apply(delta)?);
        updates.extend(state.finish());

        let mut result = TurnResult::from_updates(updates);
        result.usage = state.usage().cloned();
        result.model = state.model().map(str::to_string);
        Ok(result)
    }
}

/// One turn in flight: frames in, update batches out
struct TurnDriver {
    state: TurnState,
    decoder: ChunkDecoder,
    payloads: BoxStream<'static, Result<String>>,
    cancel: CancellationToken,
    opening: Option<Vec<Update>>,
    finished: bool,
}

impl TurnDriver {
    async fn open(
        assembler: &TurnAssembler,
        response: TransportResponse,
        cancel: CancellationToken,
        turn: u32,
    ) -> Result<Self> {
        if !response.is_success() {
            let err = response.into_error().await;
            warn!(error = %err, "server rejected the request");
            return Err(err);
        }

        let mut state = TurnState::with_turn(&assembler.profile, turn)?;
        let opening = state.start();
        Ok(Self {
            state,
            decoder: assembler.decoder.clone(),
            payloads: frames(response.into_body(), cancel.clone()),
            cancel,
            opening: Some(opening),
            finished: false,
        })
    }

    /// Next non-empty batch of updates, `None` once the turn is over
    async fn next_batch(&mut self) -> Option<Result<Vec<Update>>> {
        if let Some(opening) = self.opening.take() {
            if !opening.is_empty() {
                return Some(Ok(opening));
            }
        }
        if self.finished {
            return None;
        }

        loop {
            if self.cancel.is_cancelled() {
                return Some(Err(self.fail(DecodeError::cancelled("turn decode"))));
            }

            let payload = match self.payloads.next().await {
                Some(Ok(payload)) => payload,
                Some(Err(e)) => return Some(Err(self.fail(e))),
                None => {
                    self.finished = true;
                    return Some(Ok(self.state.finish()));
                }
            };

            let delta = match self.decoder.decode(&payload) {
                Ok(Some(delta)) => delta,
                Ok(None) => continue,
                Err(e) => return Some(Err(self.fail(e))),
            };

            let mut updates = match self.state.apply(delta) {
                Ok(updates) => updates,
                Err(e) => return Some(Err(self.fail(e))),
            };

            if self.state.is_complete() {
                debug!("tool call ended the turn before the stream did");
                updates.extend(self.state.finish());
                self.finished = true;
            }
            if !updates.is_empty() {
                return Some(Ok(updates));
            }
        }
    }

    fn fail(&mut self, err: DecodeError) -> DecodeError {
        self.state.fail();
        self.finished = true;
        err
    }
}
