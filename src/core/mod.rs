//! Core decoding pipeline
//!
//! Types, profiles, the streaming decoder, tool call reassembly and the
//! continuation loop that ties turns together.

pub mod completion;
pub mod function_calling;
pub mod profile;
pub mod streaming;
pub mod types;
