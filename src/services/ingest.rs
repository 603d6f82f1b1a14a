// src/services/ingest.rs

//! Ingestion loader.
//!
//! Reads every record set of one reference period, stamps rows with their
//! origin and period, concatenates them in source order and replaces the
//! target table in one step. Any unreadable source aborts the load before
//! the store is touched.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Batch, Period, PeriodBatch, TableRef};
use crate::storage::TableStore;
use crate::storage::records::{is_data_file, read_record_set};

use super::origin::{OriginResolver, UNKNOWN_ORIGIN};

/// One manifest entry: a record set with explicit provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSource {
    pub path: PathBuf,
    pub origin: String,
    pub period: String,
}

impl LoadSource {
    pub fn new(path: impl Into<PathBuf>, origin: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            origin: origin.into(),
            period: period.into(),
        }
    }
}

/// A TOML list of sources, e.g.
///
/// ```toml
/// [[sources]]
/// path = "raw/2025-05/chaves.json"
/// origin = "Chaves na Mão"
/// period = "2025-05"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub sources: Vec<LoadSource>,
}

impl Manifest {
    /// Load a manifest; relative paths resolve against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut manifest: Manifest = toml::from_str(&content)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for source in &mut manifest.sources {
            if source.path.is_relative() {
                source.path = base.join(&source.path);
            }
        }
        Ok(manifest)
    }
}

/// How the inputs of a load are addressed.
#[derive(Debug, Clone)]
pub enum LoadRequest {
    /// Explicit (path, origin, period) triples
    Manifest(Vec<LoadSource>),
    /// Every data file in a directory, origin inferred from the filename
    Directory { dir: PathBuf, period: String },
}

/// What a completed load wrote.
#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub table: TableRef,
    pub period: Period,
    pub rows: usize,
    pub sources: usize,
    /// Rows per origin, in first-seen order
    pub origins: Vec<(String, usize)>,
    pub digest: String,
}

/// Loads one period's record sets into a store table.
pub struct IngestionLoader {
    resolver: OriginResolver,
}

impl IngestionLoader {
    pub fn new(resolver: OriginResolver) -> Self {
        Self { resolver }
    }

    /// Resolve a request into explicit sources and the single period they share.
    pub fn resolve_sources(&self, request: &LoadRequest) -> Result<(Period, Vec<LoadSource>)> {
        match request {
            LoadRequest::Manifest(sources) => {
                let first = sources
                    .first()
                    .ok_or_else(|| AppError::validation("Manifest lists no sources"))?;
                let period = Period::parse(&first.period)?;
                for source in sources {
                    if Period::parse(&source.period)? != period {
                        return Err(AppError::validation(format!(
                            "Manifest mixes periods: {} is for {} but {} was expected",
                            source.path.display(),
                            source.period,
                            period
                        )));
                    }
                }
                Ok((period, sources.clone()))
            }
            LoadRequest::Directory { dir, period } => {
                let period = Period::parse(period)?;
                let sources = self.scan_directory(dir, &period)?;
                if sources.is_empty() {
                    return Err(AppError::validation(format!(
                        "No data files found in {}",
                        dir.display()
                    )));
                }
                Ok((period, sources))
            }
        }
    }

    /// Recognized data files in `dir`, sorted by file name.
    fn scan_directory(&self, dir: &Path, period: &Period) -> Result<Vec<LoadSource>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_data_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let origin = self.resolver.resolve(&filename);
                if origin == UNKNOWN_ORIGIN {
                    log::warn!("No origin keyword matches {filename}; tagging as '{UNKNOWN_ORIGIN}'");
                }
                LoadSource::new(path, origin, period.to_string())
            })
            .collect())
    }

    /// Read, stamp and concatenate every source without touching a store.
    pub fn prepare(&self, request: &LoadRequest) -> Result<PeriodBatch> {
        self.read_sources(request).map(|(batch, _)| batch)
    }

    fn read_sources(&self, request: &LoadRequest) -> Result<(PeriodBatch, usize)> {
        let (period, sources) = self.resolve_sources(request)?;

        let mut batches = Vec::with_capacity(sources.len());
        for source in &sources {
            let records = read_record_set(&source.path)?;
            log::info!(
                "Loaded {} records from {} ({})",
                records.len(),
                source.path.display(),
                source.origin
            );
            batches.push(Batch {
                origin: source.origin.clone(),
                period,
                records,
            });
        }
        Ok((PeriodBatch::concat(period, batches)?, sources.len()))
    }

    /// Load a period into `table`, replacing whatever it held.
    pub fn load(
        &self,
        request: &LoadRequest,
        store: &mut dyn TableStore,
        table: &TableRef,
    ) -> Result<LoadSummary> {
        let (batch, sources) = self.read_sources(request)?;

        let mut origins: Vec<(String, usize)> = Vec::new();
        for row in batch.rows() {
            match origins.iter_mut().find(|(o, _)| *o == row.origin) {
                Some((_, n)) => *n += 1,
                None => origins.push((row.origin.clone(), 1)),
            }
        }

        let rows = store.replace_table(table, &batch)?;
        Ok(LoadSummary {
            table: table.clone(),
            period: batch.period(),
            rows,
            sources,
            origins,
            digest: batch.digest(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PropertyType, RawListingRecord, Site};
    use crate::storage::{RecordSetStorage, SqliteStore};
    use tempfile::TempDir;

    fn records(n: usize, tag: &str) -> Vec<RawListingRecord> {
        (0..n)
            .map(|i| RawListingRecord {
                property_type: Some(PropertyType::House),
                location: Some(format!("{tag} {i}")),
                price: Some(format!("{}", 300_000 + i)),
                condo_fee: Some("450".to_string()),
                ..Default::default()
            })
            .collect()
    }

    fn write_json(dir: &Path, name: &str, records: &[RawListingRecord]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_vec(records).unwrap()).unwrap();
        path
    }

    fn loader() -> IngestionLoader {
        IngestionLoader::new(OriginResolver::new([
            ("chaves", "Chaves na Mão"),
            ("zap", "ZAP Imóveis"),
            ("vivareal", "Viva Real"),
        ]))
    }

    fn table() -> TableRef {
        TableRef::new("imoveis_2025", "junho").unwrap()
    }

    #[test]
    fn test_manifest_load_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let sources = vec![
            LoadSource::new(write_json(tmp.path(), "a.json", &records(2, "a")), "A", "2025-06"),
            LoadSource::new(write_json(tmp.path(), "b.json", &records(3, "b")), "B", "2025-06"),
            LoadSource::new(write_json(tmp.path(), "c.json", &records(4, "c")), "C", "2025-06"),
        ];
        let request = LoadRequest::Manifest(sources);
        let mut store = SqliteStore::new(tmp.path().join("store"));

        let first = loader().load(&request, &mut store, &table()).unwrap();
        assert_eq!(first.rows, 9);
        assert_eq!(first.sources, 3);
        assert_eq!(
            first.origins,
            vec![
                ("A".to_string(), 2),
                ("B".to_string(), 3),
                ("C".to_string(), 4)
            ]
        );
        let after_first = store.read_table(&table()).unwrap().unwrap();

        let second = loader().load(&request, &mut store, &table()).unwrap();
        let after_second = store.read_table(&table()).unwrap().unwrap();

        assert_eq!(after_first, after_second);
        assert_eq!(first.digest, second.digest);
        assert_eq!(after_second.len(), 9);
        assert!(after_second.iter().all(|r| r.period == "2025-06"));
        assert_eq!(after_second[0].origin, "A");
        assert_eq!(after_second[8].origin, "C");
    }

    #[tokio::test]
    async fn test_crawl_output_loads_into_period_table() {
        let tmp = TempDir::new().unwrap();
        let raw = RecordSetStorage::new(tmp.path().join("raw"));
        let period = Period::parse("2025-05").unwrap();

        let mut sources = Vec::new();
        for site in [Site::ChavesNaMao, Site::VivaReal, Site::Zap] {
            let mut set = records(2, site.slug());
            set[1].condo_fee = None;
            let path = raw.write(&period, site, &set).await.unwrap();
            sources.push(LoadSource::new(path, site.label(), "2025-05"));
        }

        let table = TableRef::for_period("imoveis", &period).unwrap();
        let mut store = SqliteStore::new(tmp.path().join("store"));
        let summary = loader()
            .load(&LoadRequest::Manifest(sources), &mut store, &table)
            .unwrap();
        assert_eq!(summary.rows, 6);

        let rows = store.read_table(&table).unwrap().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(store.origin_counts(&table).unwrap().len(), 3);
        assert_eq!(rows.iter().filter(|r| r.period != "2025-05").count(), 0);
        assert_eq!(rows.iter().filter(|r| r.record.condo_fee.is_none()).count(), 3);
    }

    #[test]
    fn test_directory_mode_infers_origins() {
        let tmp = TempDir::new().unwrap();
        write_json(tmp.path(), "zap.json", &records(2, "z"));
        write_json(tmp.path(), "chaves_casas.json", &records(1, "c"));
        write_json(tmp.path(), "lopes.json", &records(1, "l"));
        fs::write(tmp.path().join("notes.txt"), "not data").unwrap();

        let request = LoadRequest::Directory {
            dir: tmp.path().to_path_buf(),
            period: "2025-06".to_string(),
        };
        let (period, sources) = loader().resolve_sources(&request).unwrap();
        assert_eq!(period.to_string(), "2025-06");

        let origins: Vec<&str> = sources.iter().map(|s| s.origin.as_str()).collect();
        assert_eq!(origins, vec!["Chaves na Mão", UNKNOWN_ORIGIN, "ZAP Imóveis"]);

        let batch = loader().prepare(&request).unwrap();
        assert_eq!(batch.len(), 4);
    }

    #[test]
    fn test_parse_failure_leaves_table_untouched() {
        let tmp = TempDir::new().unwrap();
        let mut store = SqliteStore::new(tmp.path().join("store"));
        let good = LoadSource::new(write_json(tmp.path(), "a.json", &records(3, "a")), "A", "2025-06");
        loader()
            .load(&LoadRequest::Manifest(vec![good.clone()]), &mut store, &table())
            .unwrap();
        let before = store.read_table(&table()).unwrap().unwrap();

        let broken = tmp.path().join("broken.json");
        fs::write(&broken, "[{\"price\": ").unwrap();
        let request = LoadRequest::Manifest(vec![good, LoadSource::new(broken, "B", "2025-06")]);

        let err = loader().load(&request, &mut store, &table()).unwrap_err();
        assert!(matches!(err, AppError::LoadParse { .. }));
        assert_eq!(store.read_table(&table()).unwrap().unwrap(), before);
    }

    #[test]
    fn test_rejects_mixed_periods() {
        let tmp = TempDir::new().unwrap();
        let request = LoadRequest::Manifest(vec![
            LoadSource::new(write_json(tmp.path(), "a.json", &records(1, "a")), "A", "2025-06"),
            LoadSource::new(write_json(tmp.path(), "b.json", &records(1, "b")), "B", "2025-07"),
        ]);

        let err = loader().resolve_sources(&request).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_rejects_empty_inputs() {
        let tmp = TempDir::new().unwrap();
        assert!(loader().resolve_sources(&LoadRequest::Manifest(Vec::new())).is_err());

        let request = LoadRequest::Directory {
            dir: tmp.path().to_path_buf(),
            period: "2025-06".to_string(),
        };
        assert!(loader().resolve_sources(&request).is_err());
    }

    #[test]
    fn test_manifest_resolves_relative_paths() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("manifest.toml");
        fs::write(
            &manifest,
            r#"
[[sources]]
path = "raw/2025-05/chaves.json"
origin = "Chaves na Mão"
period = "2025-05"

[[sources]]
path = "/data/zap.json"
origin = "ZAP Imóveis"
period = "2025-05"
"#,
        )
        .unwrap();

        let loaded = Manifest::load(&manifest).unwrap();
        assert_eq!(loaded.sources.len(), 2);
        assert_eq!(loaded.sources[0].path, tmp.path().join("raw/2025-05/chaves.json"));
        assert_eq!(loaded.sources[1].path, PathBuf::from("/data/zap.json"));
    }
}
