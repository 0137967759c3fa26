//! Multi-turn completion
//!
//! Re-issues the request after a tool-call turn once the caller has appended
//! the tool results to the shared message list.

mod continuation;


pub use continuation::{ContinuationController, DEFAULT_MAX_CONTINUATIONS, should_continue};
