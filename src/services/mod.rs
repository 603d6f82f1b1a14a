//! Service layer for the listing pipeline.
//!
//! This module contains the business logic for:
//! - Listing crawling (`ListingCrawler`)
//! - Per-site card extraction (`SiteAdapter`)
//! - Page continuation (`PaginationController`)
//! - Field cleanup (`normalize`)
//! - Period loading (`IngestionLoader`)
//! - Origin inference from filenames (`OriginResolver`)

pub mod ingest;
pub mod listings;
pub mod normalize;
pub mod origin;
pub mod pagination;
pub mod sites;

pub use ingest::{IngestionLoader, LoadRequest, LoadSource, LoadSummary, Manifest};
pub use listings::{CrawlOutcome, ListingCrawler, build_seeds};
pub use origin::{OriginResolver, UNKNOWN_ORIGIN};
pub use pagination::{
    Continuation, PageTemplate, PaginationController, PaginationPolicy, StopReason,
};
pub use sites::{SiteAdapter, adapter_for};
