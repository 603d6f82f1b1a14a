//! Pipeline entry points for the listing pipeline.
//!
//! - `run_crawler`: Crawl every enabled site and write one record set per site
//! - `run_load`: Replace a period table with a period's record sets
//! - `run_pipeline`: Crawl, then load the period just crawled
//! - `run_validate`: Check the configuration file
//! - `run_info`: Report record sets and loaded tables for a period

pub mod crawl;
pub mod info;
pub mod load;
pub mod pipeline;
pub mod validate;

pub use crawl::{CrawlReport, run_crawler};
pub use info::{InfoReport, run_info};
pub use load::{LoadInput, run_load};
pub use pipeline::run_pipeline;
pub use validate::run_validate;
