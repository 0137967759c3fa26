//! Logging setup
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to binaries. `init_tracing` is the one the `turnstream` CLI uses.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::utils::error::{DecodeError, Result};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// Build the event filter: `RUST_LOG` wins, `default_level` otherwise
pub fn env_filter(default_level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level).map_err(|e| {
            DecodeError::configuration(format!("Invalid log level '{}': {}", default_level, e))
        }),
    }
}

/// Install a global subscriber writing to stderr
///
/// Stdout is left free for decoded output. Fails if a subscriber is already
/// installed.
pub fn init_tracing(default_level: &str, format: LogFormat) -> Result<()> {
    let filter = env_filter(default_level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| DecodeError::configuration(format!("Failed to install logger: {}", e)))
}
