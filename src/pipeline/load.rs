// src/pipeline/load.rs

//! Period load pipeline.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{Config, Period, TableRef};
use crate::services::{IngestionLoader, LoadRequest, LoadSummary, Manifest, OriginResolver};
use crate::storage::SqliteStore;

/// Where a load reads its record sets from.
#[derive(Debug, Clone)]
pub enum LoadInput {
    /// A TOML manifest of (path, origin, period) entries
    Manifest(PathBuf),
    /// A directory of record sets for `period`
    Directory { dir: PathBuf, period: Period },
}

impl LoadInput {
    fn into_request(self) -> Result<LoadRequest> {
        match self {
            LoadInput::Manifest(path) => {
                let manifest = Manifest::load(&path)?;
                log::info!(
                    "Manifest {} lists {} sources",
                    path.display(),
                    manifest.sources.len()
                );
                Ok(LoadRequest::Manifest(manifest.sources))
            }
            LoadInput::Directory { dir, period } => Ok(LoadRequest::Directory {
                dir,
                period: period.to_string(),
            }),
        }
    }
}

/// Load a period into the store.
///
/// Without an explicit `table` the period's default table is replaced
/// (`{schema_prefix}_{YYYY}.{month}`).
pub fn run_load(
    config: &Config,
    base_path: &Path,
    input: LoadInput,
    table: Option<TableRef>,
) -> Result<LoadSummary> {
    let request = input.into_request()?;
    let loader = IngestionLoader::new(OriginResolver::from_config(config));

    let table = match table {
        Some(table) => table,
        None => {
            let (period, _) = loader.resolve_sources(&request)?;
            TableRef::for_period(&config.store.schema_prefix, &period)?
        }
    };

    let mut store = SqliteStore::new(config.paths.store_dir(base_path));
    log::info!("Loading into {table}");
    let summary = loader.load(&request, &mut store, &table)?;

    log::info!(
        "Loaded {} rows from {} sources into {} ({})",
        summary.rows,
        summary.sources,
        summary.table,
        summary.period
    );
    for (origin, count) in &summary.origins {
        log::info!("  {origin}: {count}");
    }
    log::debug!("Batch digest: {}", summary.digest);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawListingRecord, Site};
    use crate::storage::{RecordSetStorage, TableStore};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_directory_load_uses_default_table() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let period = Period::parse("2025-05").unwrap();
        let raw = RecordSetStorage::new(config.paths.raw_dir(tmp.path()));
        raw.write(&period, Site::Olx, &[RawListingRecord::default()])
            .await
            .unwrap();

        let input = LoadInput::Directory {
            dir: raw.period_dir(&period),
            period,
        };
        let summary = run_load(&config, tmp.path(), input, None).unwrap();

        assert_eq!(summary.table.to_string(), "imoveis_2025.maio");
        assert_eq!(summary.origins, vec![("OLX".to_string(), 1)]);

        let store = SqliteStore::new(config.paths.store_dir(tmp.path()));
        assert_eq!(store.read_table(&summary.table).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_explicit_table_overrides_default() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let data = tmp.path().join("lopes.json");
        std::fs::write(&data, "[{\"preco\": 1000}]").unwrap();
        let manifest = tmp.path().join("manifest.toml");
        std::fs::write(
            &manifest,
            "[[sources]]\npath = \"lopes.json\"\norigin = \"Imobiliária Lopes\"\nperiod = \"2025-06\"\n",
        )
        .unwrap();

        let table = TableRef::new("analise", "lopes_junho").unwrap();
        let summary = run_load(
            &config,
            tmp.path(),
            LoadInput::Manifest(manifest),
            Some(table.clone()),
        )
        .unwrap();

        assert_eq!(summary.table, table);
        assert!(tmp.path().join("store").join("analise.sqlite").exists());
    }
}
