//! SQLite table store.
//!
//! Each schema is its own database file under the store directory
//! (`{root}/{schema}.sqlite`). A table replace stages the batch into a
//! scratch table and swaps it in within a single transaction, so a crash
//! or error at any point leaves the previous table as it was.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

use crate::error::{AppError, Result};
use crate::models::{PeriodBatch, PropertyType, RawListingRecord, StoredRow, TableRef};

use super::TableStore;

const STAGING_PREFIX: &str = "_staging_";

const COLUMNS: &str = "property_type, location, area, rooms, bathrooms, parking_spots, \
                       price, condo_fee, origin, period";

const COLUMN_DDL: &str = "
    property_type TEXT,
    location TEXT,
    area TEXT,
    rooms TEXT,
    bathrooms TEXT,
    parking_spots TEXT,
    price TEXT,
    condo_fee TEXT,
    origin TEXT NOT NULL,
    period TEXT NOT NULL
";

/// SQLite-backed analytical store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    root_dir: PathBuf,
}

impl SqliteStore {
    /// Create a store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn schema_path(&self, schema: &str) -> PathBuf {
        self.root_dir.join(format!("{schema}.sqlite"))
    }

    fn open(path: &Path) -> rusqlite::Result<Connection> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(conn)
    }

    /// Open a schema for reading; `None` if it was never written.
    fn open_existing(&self, schema: &str) -> Result<Option<Connection>> {
        let path = self.schema_path(schema);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::open(&path)?))
    }

    fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Stage rows into a scratch table, then drop and rename in one transaction.
    fn swap_in(conn: &mut Connection, table: &str, batch: &PeriodBatch) -> rusqlite::Result<usize> {
        let staging = format!("{STAGING_PREFIX}{table}");
        let tx = conn.transaction()?;

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{staging}\"; CREATE TABLE \"{staging}\" ({COLUMN_DDL});"
        ))?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO \"{staging}\" ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ))?;
            for row in batch.rows() {
                let r = &row.record;
                insert.execute(params![
                    r.property_type.map(|t| t.as_str()),
                    r.location,
                    r.area,
                    r.rooms,
                    r.bathrooms,
                    r.parking_spots,
                    r.price,
                    r.condo_fee,
                    row.origin,
                    row.period,
                ])?;
            }
        }
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{table}\"; ALTER TABLE \"{staging}\" RENAME TO \"{table}\";"
        ))?;
        tx.commit()?;
        Ok(batch.len())
    }
}

impl TableStore for SqliteStore {
    fn replace_table(&mut self, table: &TableRef, batch: &PeriodBatch) -> Result<usize> {
        std::fs::create_dir_all(&self.root_dir)?;
        let path = self.schema_path(table.schema());

        let mut conn = Self::open(&path).map_err(|e| AppError::store(table, e))?;
        let written = Self::swap_in(&mut conn, table.table(), batch).map_err(|e| {
            AppError::store(table, format!("{e} (previous table left intact)"))
        })?;

        log::info!("Table {table} replaced with {written} rows");
        Ok(written)
    }

    fn read_table(&self, table: &TableRef) -> Result<Option<Vec<StoredRow>>> {
        let Some(conn) = self.open_existing(table.schema())? else {
            return Ok(None);
        };
        if !Self::table_exists(&conn, table.table())? {
            return Ok(None);
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM \"{}\" ORDER BY rowid",
            table.table()
        ))?;
        let rows = stmt.query_map([], |row| {
            let property_type: Option<String> = row.get(0)?;
            Ok(StoredRow {
                record: RawListingRecord {
                    property_type: property_type.as_deref().and_then(PropertyType::from_label),
                    location: row.get(1)?,
                    area: row.get(2)?,
                    rooms: row.get(3)?,
                    bathrooms: row.get(4)?,
                    parking_spots: row.get(5)?,
                    price: row.get(6)?,
                    condo_fee: row.get(7)?,
                },
                origin: row.get(8)?,
                period: row.get(9)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(Some(out))
    }

    fn origin_counts(&self, table: &TableRef) -> Result<Vec<(String, usize)>> {
        let Some(conn) = self.open_existing(table.schema())? else {
            return Ok(Vec::new());
        };
        if !Self::table_exists(&conn, table.table())? {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT origin, COUNT(*) FROM \"{}\" GROUP BY origin ORDER BY origin",
            table.table()
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        let Some(conn) = self.open_existing(schema)? else {
            return Ok(Vec::new());
        };

        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for name in names {
            let name = name?;
            if !name.starts_with(STAGING_PREFIX) {
                out.push(name);
            }
        }
        Ok(out)
    }
}
