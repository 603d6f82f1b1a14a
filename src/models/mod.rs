// src/models/mod.rs

//! Domain models for the listing pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod batch;
mod config;
mod listing;
mod seed;

// Re-export all public types
pub use batch::{Batch, Period, PeriodBatch, StoredRow, TableRef, digest_rows};
pub use config::{
    Config, CrawlerConfig, OriginKeyword, PathsConfig, SeedUrl, SiteConfig, StoreConfig,
};
pub use listing::{PropertyType, RawListingRecord};
pub use seed::{CrawlSeed, SeedId, Site};
