//! Configuration validation

use super::DecoderConfig;
use crate::core::profile::DecoderProfile;
use tracing::debug;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Trait for validating configuration values
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl Validate for DecoderProfile {
    fn validate(&self) -> Result<(), String> {
        DecoderProfile::validate(self)
    }
}

impl Validate for DecoderConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating decoder configuration");

        if let Some(profile) = &self.custom_profile {
            Validate::validate(profile)?;
        } else if DecoderProfile::preset(&self.profile, &self.candidates).is_none() {
            return Err(format!(
                "Unknown profile '{}'; expected one of: {}",
                self.profile,
                DecoderProfile::preset_names().join(", ")
            ));
        }

        if self.candidates.iter().any(|name| name.trim().is_empty()) {
            return Err("Candidate function names cannot be empty".to_string());
        }

        if self.max_tool_buffer_bytes == Some(0) {
            return Err("max_tool_buffer_bytes must be greater than 0".to_string());
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log level '{}'; expected one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        Ok(())
    }
}
