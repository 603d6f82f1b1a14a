// src/pipeline/validate.rs

use std::path::Path;

use crate::error::Result;
use crate::models::Config;

/// Load the configuration strictly and validate it.
///
/// A missing file validates the built-in defaults.
pub fn run_validate(config_path: &Path) -> Result<Config> {
    log::info!("Validating configuration...");

    let config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        log::warn!(
            "{} not found; validating defaults",
            config_path.display()
        );
        Config::default()
    };

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {e}");
        return Err(e);
    }

    log::info!("✓ Config OK");
    log::info!("  User agent: {}", config.crawler.user_agent);
    log::info!("  Timeout: {}s", config.crawler.timeout_secs);
    log::info!("  Max concurrent: {}", config.crawler.max_concurrent);
    for site in &config.sites {
        log::info!(
            "  {}: {} seeds, {} pages max{}",
            site.site.label(),
            site.seeds.len(),
            site.max_pages,
            if site.enabled { "" } else { " (disabled)" }
        );
    }
    log::info!("  Origin keywords: {}", config.origins.len());

    Ok(config)
}
