//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Highest scan cost the configuration accepts.
pub const MAX_SCAN_COST: u32 = 5;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Record store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// External lookup settings
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.store.scan_cost > MAX_SCAN_COST {
            return Err(AppError::validation(format!(
                "store.scan_cost must be between 0 and {MAX_SCAN_COST}"
            )));
        }
        if self.enrichment.api_base.trim().is_empty() {
            return Err(AppError::validation("enrichment.api_base is empty"));
        }
        if self.enrichment.model.trim().is_empty() {
            return Err(AppError::validation("enrichment.model is empty"));
        }
        if self.enrichment.api_key_env.trim().is_empty() {
            return Err(AppError::validation("enrichment.api_key_env is empty"));
        }
        if self.enrichment.timeout_secs == 0 {
            return Err(AppError::validation("enrichment.timeout_secs must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.enrichment.temperature) {
            return Err(AppError::validation(
                "enrichment.temperature must be between 0.0 and 2.0",
            ));
        }
        Ok(())
    }
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Effort cost of digitizing a book, subtracted from the digital utility
    #[serde(default = "defaults::scan_cost")]
    pub scan_cost: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scan_cost: defaults::scan_cost(),
        }
    }
}

/// Settings for the chat-completions lookup service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Whether lookups run at all
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Model name sent with each request
    #[serde(default = "defaults::model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "defaults::temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Environment variable holding the API key
    #[serde(default = "defaults::api_key_env")]
    pub api_key_env: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            api_base: defaults::api_base(),
            model: defaults::model(),
            temperature: defaults::temperature(),
            timeout_secs: defaults::timeout(),
            api_key_env: defaults::api_key_env(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is not set
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Store defaults
    pub fn scan_cost() -> u32 {
        2
    }

    // Enrichment defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn api_base() -> String {
        "https://api.openai.com/v1".into()
    }
    pub fn model() -> String {
        "gpt-4o".into()
    }
    pub fn temperature() -> f32 {
        0.1
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn api_key_env() -> String {
        "OPENAI_API_KEY".into()
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}
