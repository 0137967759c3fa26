//! Core types
//!
//! Defines the decoded increment (`Delta`), the caller-facing `Update` stream
//! items, and the message list shared with the continuation controller.

mod delta;
mod finish_reason;
mod message;
mod update;
mod usage;

pub use delta::{Delta, ToolCallFragment};
pub use finish_reason::FinishReason;
pub use message::{ChatMessage, MessageRole, SharedMessages};
pub use update::{AssembledToolCall, TurnResult, Update};
pub use usage::Usage;
