//! Reference periods, batches and store table addressing.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

use super::RawListingRecord;

/// A "YYYY-MM" reference period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Parse a strict "YYYY-MM" string.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || AppError::validation(format!("Invalid period '{s}'. Use YYYY-MM (e.g., 2025-06)"));
        if s.len() != 7 || s.as_bytes()[4] != b'-' {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").map_err(|_| invalid())?;
        Ok(Self {
            year: date.year(),
            month: date.month(),
        })
    }

    /// The period containing today's local date.
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

const MONTH_NAMES: [&str; 12] = [
    "janeiro", "fevereiro", "marco", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("static regex"))
}

/// A (schema, table) pair naming one table in the store.
///
/// Both parts are restricted to plain SQL identifiers since they are
/// interpolated into DDL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    schema: String,
    table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Result<Self> {
        let schema = schema.into();
        let table = table.into();
        for name in [&schema, &table] {
            if !identifier_pattern().is_match(name) {
                return Err(AppError::validation(format!(
                    "'{name}' is not a valid schema or table name"
                )));
            }
        }
        Ok(Self { schema, table })
    }

    /// Default table for a period: schema `{prefix}_{YYYY}`, table named
    /// after the month (e.g. `imoveis_2025.maio`).
    pub fn for_period(prefix: &str, period: &Period) -> Result<Self> {
        let month = MONTH_NAMES[(period.month() - 1) as usize];
        Self::new(format!("{prefix}_{}", period.year()), month)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Records read from one source, stamped with their origin and period.
#[derive(Debug, Clone)]
pub struct Batch {
    pub origin: String,
    pub period: Period,
    pub records: Vec<RawListingRecord>,
}

/// One row of a store table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    #[serde(flatten)]
    pub record: RawListingRecord,
    pub origin: String,
    pub period: String,
}

/// All rows of one period, in source order, ready for a table replace.
#[derive(Debug, Clone)]
pub struct PeriodBatch {
    period: Period,
    rows: Vec<StoredRow>,
}

impl PeriodBatch {
    /// Concatenate batches, preserving the given order of sources and
    /// each source's internal row order.
    pub fn concat(period: Period, batches: Vec<Batch>) -> Result<Self> {
        let mut rows = Vec::with_capacity(batches.iter().map(|b| b.records.len()).sum());
        for batch in batches {
            if batch.period != period {
                return Err(AppError::validation(format!(
                    "Batch from '{}' is for {} but the load targets {}",
                    batch.origin, batch.period, period
                )));
            }
            let stamp = batch.period.to_string();
            rows.extend(batch.records.into_iter().map(|record| StoredRow {
                record,
                origin: batch.origin.clone(),
                period: stamp.clone(),
            }));
        }
        Ok(Self { period, rows })
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn rows(&self) -> &[StoredRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct origins present in the batch.
    pub fn origins(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.origin.as_str()).collect()
    }

    /// SHA-256 over the canonical JSON serialization of the rows.
    pub fn digest(&self) -> String {
        digest_rows(&self.rows)
    }
}

/// Hex SHA-256 of a row sequence; equal rows in equal order hash equally.
pub fn digest_rows(rows: &[StoredRow]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        // Serializing a plain struct of strings cannot fail.
        if let Ok(bytes) = serde_json::to_vec(row) {
            hasher.update(&bytes);
        }
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
