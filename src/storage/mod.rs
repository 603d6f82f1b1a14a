//! Storage abstractions.
//!
//! - Record sets: crawl output, one JSON file per (period, site)
//! - Table store: the analytical store that loaded periods land in
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml
//! ├── raw/                  # Record sets
//! │   └── 2025-05/
//! │       └── zap.json
//! └── store/                # One SQLite file per schema
//!     └── imoveis_2025.sqlite
//! ```

pub mod records;
pub mod sqlite;

use crate::error::Result;
use crate::models::{PeriodBatch, StoredRow, TableRef};

// Re-export for convenience
pub use records::RecordSetStorage;
pub use sqlite::SqliteStore;

/// Trait for analytical table stores.
///
/// Every write is a full replace: a table holds exactly one batch, and
/// readers observe either the previous content or the new one.
pub trait TableStore {
    /// Replace the table's entire content with `batch`; returns rows written.
    ///
    /// On failure the previous table, if any, is left untouched.
    fn replace_table(&mut self, table: &TableRef, batch: &PeriodBatch) -> Result<usize>;

    /// All rows in insertion order, or `None` if the table does not exist.
    fn read_table(&self, table: &TableRef) -> Result<Option<Vec<StoredRow>>>;

    /// Row count per origin, sorted by origin.
    fn origin_counts(&self, table: &TableRef) -> Result<Vec<(String, usize)>>;

    /// Live tables in a schema, sorted by name.
    fn list_tables(&self, schema: &str) -> Result<Vec<String>>;
}
