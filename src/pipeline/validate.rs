// src/pipeline/validate.rs

//! Validate pipeline: check configuration without touching any data.

use crate::error::Result;
use crate::models::Config;

/// Validate configuration and report the effective values.
pub fn run_validate(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    log::info!("✓ Config OK");
    log::info!("    scan_cost: {}", config.store.scan_cost);
    log::info!(
        "    enrichment: {} ({} via {})",
        if config.enrichment.enabled { "enabled" } else { "disabled" },
        config.enrichment.model,
        config.enrichment.api_base
    );
    log::info!("    api key variable: {}", config.enrichment.api_key_env);
    Ok(())
}
