// src/pipeline/crawl.rs

//! Listing crawl pipeline.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, Period, Site};
use crate::services::{ListingCrawler, build_seeds};
use crate::storage::RecordSetStorage;
use crate::utils::http::{HttpFetcher, PageFetcher};

/// What a crawl run wrote.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub period: Period,
    /// (site, record-set path, record count) per crawled site
    pub files: Vec<(Site, PathBuf, usize)>,
    pub pages_fetched: usize,
    pub seed_failures: usize,
}

impl CrawlReport {
    pub fn record_count(&self) -> usize {
        self.files.iter().map(|(_, _, n)| n).sum()
    }
}

/// Run the listing crawler over HTTP.
pub async fn run_crawler(
    config: &Config,
    storage: &RecordSetStorage,
    period: &Period,
    only: &[Site],
) -> Result<CrawlReport> {
    let fetcher = HttpFetcher::new(&config.crawler)?;
    crawl_with(config, Box::new(fetcher), storage, period, only).await
}

/// Run the crawler with any page source and write its record sets.
///
/// The configuration is validated first. Every crawled site gets a record
/// set, empty if nothing was extracted.
pub async fn crawl_with(
    config: &Config,
    fetcher: Box<dyn PageFetcher>,
    storage: &RecordSetStorage,
    period: &Period,
    only: &[Site],
) -> Result<CrawlReport> {
    config.validate()?;
    let seeds = build_seeds(config, only)?;
    if seeds.is_empty() {
        return Err(AppError::config("No enabled site has seeds to crawl"));
    }
    let sites: BTreeSet<Site> = seeds.iter().map(|s| s.site).collect();

    let start_time = Utc::now();
    log::info!(
        "Crawling {} seeds across {} sites for {period}",
        seeds.len(),
        sites.len()
    );

    let crawler = ListingCrawler::new(config, fetcher)?;
    let mut outcome = crawler.crawl(seeds).await;

    let mut files = Vec::with_capacity(sites.len());
    for site in sites {
        let records = outcome.records.remove(&site).unwrap_or_default();
        let path = storage.write(period, site, &records).await?;
        files.push((site, path, records.len()));
    }

    let elapsed = Utc::now() - start_time;
    log::info!(
        "Crawl finished in {}s: {} pages, {} records",
        elapsed.num_seconds(),
        outcome.pages_fetched,
        files.iter().map(|(_, _, n)| n).sum::<usize>()
    );
    if outcome.seed_failures > 0 {
        log::warn!(
            "{} of {} seeds ended on a fetch failure",
            outcome.seed_failures,
            outcome.seed_total
        );
    }

    Ok(CrawlReport {
        period: *period,
        files,
        pages_fetched: outcome.pages_fetched,
        seed_failures: outcome.seed_failures,
    })
}
