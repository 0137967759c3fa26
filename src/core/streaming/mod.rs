//! Streaming decode pipeline
//!
//! Frame reader → chunk decoder → splitter and tool call assembler → turn
//! assembler. Each stage is usable on its own; [`TurnAssembler`] wires them
//! together over a [`TransportResponse`].

pub mod assembler;
pub mod decoder;
pub mod splitter;
pub mod sse;
pub mod transport;
pub mod turn;

pub use assembler::{TurnAssembler, UpdateStream};
pub use decoder::ChunkDecoder;
pub use splitter::{Phase, ReasoningSplitter};
pub use sse::{ByteStream, DONE_MARKER, Frame, SseFrameParser, frames};
pub use transport::{ChatTransport, TransportResponse, server_error_detail};
pub use turn::{TurnState, TurnStatus};
