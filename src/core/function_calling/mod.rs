//! Tool call reassembly
//!
//! Calls reach the decoder in one of three encodings, selected per profile:
//! structured `tool_calls` fragments, a bare function name followed by JSON
//! arguments as text, or `<tool_call>` blocks inside the text.

pub mod assembler;
pub mod ids;
pub mod json;
pub mod name_prefixed;
pub mod structured;
pub mod tagged;

pub use assembler::ToolCallAssembler;
pub use ids::{CallIdAllocator, generate_call_id};
pub use json::JsonScanner;
pub use name_prefixed::NamePrefixedAssembler;
pub use structured::StructuredAssembler;
pub use tagged::TaggedAssembler;
