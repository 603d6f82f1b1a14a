//! Record-set files.
//!
//! The crawl materializes one record set per (period, site):
//!
//! ```text
//! {raw_dir}/
//! └── 2025-05/
//!     ├── chaves.json
//!     ├── olx.json
//!     ├── vivareal.json
//!     └── zap.json
//! ```
//!
//! Files are JSON arrays of records. JSON Lines (`.jsonl`) files are also
//! recognized when loading.

use std::fs;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Period, RawListingRecord, Site};

/// Extensions the loader treats as data files.
pub const DATA_EXTENSIONS: [&str; 2] = ["json", "jsonl"];

/// Whether `path` has a recognized data-file extension.
pub fn is_data_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DATA_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Parse a record-set file. Any malformed entry fails the whole file.
pub fn read_record_set(path: &Path) -> Result<Vec<RawListingRecord>> {
    let content = fs::read_to_string(path).map_err(|e| AppError::load_parse(path, e))?;

    let is_lines = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jsonl"));

    if is_lines {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .map_err(|e| AppError::load_parse(path, format!("line {}: {e}", i + 1)))
            })
            .collect()
    } else {
        serde_json::from_str(&content).map_err(|e| AppError::load_parse(path, e))
    }
}

/// Filesystem store for crawl output.
#[derive(Debug, Clone)]
pub struct RecordSetStorage {
    root_dir: PathBuf,
}

impl RecordSetStorage {
    /// Create storage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Directory holding one period's record sets.
    pub fn period_dir(&self, period: &Period) -> PathBuf {
        self.root_dir.join(period.to_string())
    }

    /// Path of a site's record set for a period.
    pub fn path_for(&self, period: &Period, site: Site) -> PathBuf {
        self.period_dir(period).join(format!("{}.json", site.slug()))
    }

    /// Write a record set atomically (write to temp, then rename).
    pub async fn write(
        &self,
        period: &Period,
        site: Site,
        records: &[RawListingRecord],
    ) -> Result<PathBuf> {
        let path = self.path_for(period, site);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(records)?;
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        log::info!("Wrote {} records to {}", records.len(), path.display());
        Ok(path)
    }
}
