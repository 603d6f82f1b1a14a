// src/pipeline/pipeline.rs

use std::path::Path;

use crate::error::Result;
use crate::models::{Config, Period, Site};
use crate::services::LoadSummary;
use crate::storage::RecordSetStorage;

use super::crawl::run_crawler;
use super::load::{LoadInput, run_load};

/// Run the full pipeline: crawl a period, then load it.
pub async fn run_pipeline(
    config: &Config,
    base_path: &Path,
    period: &Period,
    only: &[Site],
) -> Result<LoadSummary> {
    let storage = RecordSetStorage::new(config.paths.raw_dir(base_path));

    log::info!("Step 1/2: Crawl - Fetching listings for {period}");
    let report = run_crawler(config, &storage, period, only).await?;
    log::info!(
        "Crawled {} records into {} record sets",
        report.record_count(),
        report.files.len()
    );

    log::info!("Step 2/2: Load - Replacing the {period} table");
    let input = LoadInput::Directory {
        dir: storage.period_dir(period),
        period: *period,
    };
    let summary = run_load(config, base_path, input, None)?;

    log::info!("Pipeline complete!");
    Ok(summary)
}
