//! Engine configuration
//!
//! Loaded from TOML; every field has a default so an empty document is a
//! valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::errors::EngineError;

pub const DEFAULT_EXTERNAL_CALL_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for each provider or content resolver call
    pub external_call_timeout_ms: u64,
    /// `std` commands the eager executor leaves to the caller
    pub excluded_commands: Vec<String>,
    /// Truncate the suggestion list to this many items
    pub max_suggestions: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            external_call_timeout_ms: DEFAULT_EXTERNAL_CALL_TIMEOUT_MS,
            excluded_commands: vec!["load".to_string()],
            max_suggestions: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.external_call_timeout_ms == 0 {
            return Err(EngineError::Config(
                "external_call_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn external_call_timeout(&self) -> Duration {
        Duration::from_millis(self.external_call_timeout_ms)
    }

    pub fn excluded(&self) -> Vec<&str> {
        self.excluded_commands.iter().map(String::as_str).collect()
    }
}
