// src/pipeline/info.rs

//! Period status report.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{Config, Period, TableRef};
use crate::storage::records::{is_data_file, read_record_set};
use crate::storage::{SqliteStore, TableStore};

/// Record sets on disk and loaded rows for one period.
#[derive(Debug, Clone)]
pub struct InfoReport {
    pub period: Period,
    pub table: TableRef,
    /// (path, record count); `None` when the file does not parse
    pub record_sets: Vec<(PathBuf, Option<usize>)>,
    /// Rows per origin in the period table, sorted by origin
    pub origin_counts: Vec<(String, usize)>,
    /// Every live table in the period's schema
    pub tables: Vec<String>,
}

impl InfoReport {
    pub fn loaded_rows(&self) -> usize {
        self.origin_counts.iter().map(|(_, n)| n).sum()
    }
}

/// Inspect the record sets and the default table of a period.
pub fn run_info(config: &Config, base_path: &Path, period: &Period) -> Result<InfoReport> {
    let raw_dir = config.paths.raw_dir(base_path).join(period.to_string());
    let table = TableRef::for_period(&config.store.schema_prefix, period)?;
    let store = SqliteStore::new(config.paths.store_dir(base_path));

    let mut record_sets = Vec::new();
    if raw_dir.is_dir() {
        let mut paths: Vec<PathBuf> = fs::read_dir(&raw_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_data_file(p))
            .collect();
        paths.sort();
        for path in paths {
            let count = match read_record_set(&path) {
                Ok(records) => Some(records.len()),
                Err(e) => {
                    log::warn!("{e}");
                    None
                }
            };
            record_sets.push((path, count));
        }
    }

    let report = InfoReport {
        period: *period,
        origin_counts: store.origin_counts(&table)?,
        tables: store.list_tables(table.schema())?,
        table,
        record_sets,
    };

    log::info!("Period: {}", report.period);
    if report.record_sets.is_empty() {
        log::info!("No record sets in {}", raw_dir.display());
    }
    for (path, count) in &report.record_sets {
        match count {
            Some(n) => log::info!("  {}: {n} records", path.display()),
            None => log::info!("  {}: unreadable", path.display()),
        }
    }

    if report.origin_counts.is_empty() {
        log::info!("Table {} not loaded yet.", report.table);
    } else {
        log::info!("Table {}: {} rows", report.table, report.loaded_rows());
        for (origin, n) in &report.origin_counts {
            log::info!("  {origin}: {n}");
        }
    }
    if !report.tables.is_empty() {
        log::info!("Tables in {}: {}", report.table.schema(), report.tables.join(", "));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::load::{LoadInput, run_load};
    use crate::models::{RawListingRecord, Site};
    use crate::storage::RecordSetStorage;
    use tempfile::TempDir;

    #[test]
    fn test_empty_period() {
        let tmp = TempDir::new().unwrap();
        let period = Period::parse("2025-01").unwrap();
        let report = run_info(&Config::default(), tmp.path(), &period).unwrap();

        assert!(report.record_sets.is_empty());
        assert!(report.tables.is_empty());
        assert_eq!(report.loaded_rows(), 0);
        assert_eq!(report.table.to_string(), "imoveis_2025.janeiro");
    }

    #[tokio::test]
    async fn test_reports_files_and_loaded_rows() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let period = Period::parse("2025-05").unwrap();
        let raw = RecordSetStorage::new(config.paths.raw_dir(tmp.path()));
        raw.write(&period, Site::Zap, &vec![RawListingRecord::default(); 3])
            .await
            .unwrap();
        fs::write(raw.period_dir(&period).join("broken.json"), "{").unwrap();

        let before = run_info(&config, tmp.path(), &period).unwrap();
        assert_eq!(before.record_sets.len(), 2);
        assert_eq!(before.record_sets[0].1, None);
        assert_eq!(before.record_sets[1].1, Some(3));

        fs::remove_file(raw.period_dir(&period).join("broken.json")).unwrap();
        let input = LoadInput::Directory {
            dir: raw.period_dir(&period),
            period,
        };
        run_load(&config, tmp.path(), input, None).unwrap();

        let after = run_info(&config, tmp.path(), &period).unwrap();
        assert_eq!(after.origin_counts, vec![("ZAP Imóveis".to_string(), 3)]);
        assert_eq!(after.tables, vec!["maio"]);
    }
}
