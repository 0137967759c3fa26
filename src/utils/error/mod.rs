//! Error handling for the decoding pipeline
//!
//! A single error type covers every failure a turn can end with. Malformed
//! individual chunks never surface here; they are skipped by the chunk decoder.

mod helpers;
mod types;

pub use types::{DecodeError, Result};
