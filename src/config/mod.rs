//! Decoder configuration
//!
//! Loaded from a YAML file or from `TURNSTREAM_*` environment variables. A
//! configuration names a built-in profile (or carries an inline one) plus the
//! limits that apply around it.

mod validation;

pub use validation::Validate;

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{debug, info};

use crate::core::completion::DEFAULT_MAX_CONTINUATIONS;
use crate::core::profile::DecoderProfile;
use crate::core::streaming::TurnAssembler;
use crate::utils::error::{DecodeError, Result};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TURNSTREAM_";

/// Top-level decoder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Built-in profile name
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Inline profile; takes precedence over `profile`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_profile: Option<DecoderProfile>,

    /// Candidate function names for the name-prefixed family
    #[serde(default)]
    pub candidates: Vec<String>,

    /// Automatic follow-up turns; `null` means unbounded
    #[serde(default = "default_max_continuations")]
    pub max_continuations: Option<u32>,

    /// Override for the per-call argument buffer limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tool_buffer_bytes: Option<usize>,

    /// Default log level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_profile() -> String {
    "openai".to_string()
}

fn default_max_continuations() -> Option<u32> {
    Some(DEFAULT_MAX_CONTINUATIONS)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            custom_profile: None,
            candidates: Vec::new(),
            max_continuations: default_max_continuations(),
            max_tool_buffer_bytes: None,
            log_level: default_log_level(),
        }
    }
}

impl DecoderConfig {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DecodeError::configuration(format!("Failed to read config file: {}", e))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| DecodeError::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate().map_err(DecodeError::configuration)?;
        debug!(profile = %config.profile, "configuration loaded");
        Ok(config)
    }

    /// Load configuration from `TURNSTREAM_*` environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` with the environment swapped out
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(profile) = var("PROFILE") {
            config.profile = profile.trim().to_string();
        }
        if let Some(tools) = var("TOOLS") {
            config.candidates = tools
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(max) = var("MAX_CONTINUATIONS") {
            config.max_continuations = match max.trim() {
                "none" | "unbounded" => None,
                value => Some(value.parse().map_err(|e| {
                    DecodeError::configuration(format!("Invalid max continuations: {}", e))
                })?),
            };
        }
        if let Some(bytes) = var("MAX_TOOL_BUFFER_BYTES") {
            config.max_tool_buffer_bytes = Some(bytes.trim().parse().map_err(|e| {
                DecodeError::configuration(format!("Invalid tool buffer size: {}", e))
            })?);
        }
        if let Some(level) = var("LOG_LEVEL") {
            config.log_level = level.trim().to_lowercase();
        }

        config.validate().map_err(DecodeError::configuration)?;
        Ok(config)
    }

    /// The decoder profile this configuration selects
    pub fn resolve_profile(&self) -> Result<DecoderProfile> {
        let mut profile = match &self.custom_profile {
            Some(profile) => profile.clone(),
            None => DecoderProfile::preset(&self.profile, &self.candidates).ok_or_else(|| {
                DecodeError::configuration(format!(
                    "Unknown profile '{}'; expected one of: {}",
                    self.profile,
                    DecoderProfile::preset_names().join(", ")
                ))
            })?,
        };

        if self.custom_profile.is_some() && !self.candidates.is_empty() {
            profile = profile.with_candidates(self.candidates.iter().cloned());
        }
        if let Some(bytes) = self.max_tool_buffer_bytes {
            profile.max_tool_buffer_bytes = bytes;
        }
        Ok(profile)
    }

    /// Turn assembler for the selected profile
    pub fn assembler(&self) -> Result<TurnAssembler> {
        TurnAssembler::new(self.resolve_profile()?)
    }
}
