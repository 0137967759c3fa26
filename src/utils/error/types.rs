//! Error types for turn decoding

use thiserror::Error;

/// Result type alias for the decoder
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Unified decoding error
///
/// | Variant | Raised when | Fatal to the turn |
/// |------|------|------|
/// | Transport | Non-success status, or a server error object mid-stream | Yes |
/// | Network | The byte stream itself failed | Yes |
/// | Cancelled | The cancellation token fired during a read | Yes (distinct terminal state) |
/// | BufferOverflow | A tool call's argument buffer exceeded its limit | Yes |
/// | ResponseParsing | A non-streamed body could not be parsed | Yes |
/// | Configuration | Invalid decoder configuration | n/a |
/// | Serialization | JSON encoding of an update failed | n/a |
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// Server answered with a non-success status or reported an error object
    #[error("Server returned status {status}: {message}")]
    Transport { status: u16, message: String },

    /// Reading the response body failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// The turn was cancelled while waiting on the transport
    #[error("Decoding cancelled during {operation}")]
    Cancelled { operation: String },

    /// A tool call grew past the configured buffer limit
    #[error("Tool call '{tool_name}' exceeded the {limit} byte argument buffer")]
    BufferOverflow { tool_name: String, limit: usize },

    /// A complete (non-streamed) response body could not be decoded
    #[error("Failed to parse response: {message}")]
    ResponseParsing { message: String },

    /// Invalid profile or configuration values
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for DecodeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<reqwest::Error> for DecodeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}
