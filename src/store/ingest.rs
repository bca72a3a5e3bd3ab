//! Building the credential store from breach lists.
//!
//! # Layout
//! ```text
//! <data_dir>/passwords/<source>.txt   one password per line
//! <data_dir>/usernames/<source>.txt   one username per line
//! ```
//!
//! The file stem becomes the source label of every row read from it. The
//! database is written to a sibling `.building` file and renamed into place,
//! so a failed ingest never leaves a half-populated store behind.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, Transaction};

use crate::store::query::Dataset;
use crate::store::StoreError;

/// Row counts written by an ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub passwords: u64,
    pub usernames: u64,
}

impl IngestSummary {
    fn record(&mut self, dataset: Dataset, rows: u64) {
        match dataset {
            Dataset::Passwords => self.passwords = rows,
            Dataset::Usernames => self.usernames = rows,
        }
    }
}

/// Create (or replace) the database at `database_path` from `data_dir`.
pub fn ingest(data_dir: &Path, database_path: &Path) -> Result<IngestSummary, StoreError> {
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staging = staging_path(database_path);
    if staging.exists() {
        fs::remove_file(&staging)?;
    }

    let mut conn = Connection::open(&staging)?;
    let mut summary = IngestSummary::default();

    for dataset in Dataset::ALL {
        let tx = conn.transaction()?;
        create_table(&tx, dataset)?;

        let dir = data_dir.join(dataset.table());
        for file in list_sources(&dir)? {
            load_file(&tx, dataset, &file)?;
        }

        let rows: u64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM {}", dataset.table()),
            [],
            |row| row.get(0),
        )?;
        tx.commit()?;

        tracing::info!(dataset = %dataset, rows, "Table populated");
        summary.record(dataset, rows);
    }

    conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
    fs::rename(&staging, database_path)?;

    Ok(summary)
}

fn staging_path(database_path: &Path) -> PathBuf {
    let mut name = database_path.as_os_str().to_owned();
    name.push(".building");
    PathBuf::from(name)
}

fn create_table(tx: &Transaction<'_>, dataset: Dataset) -> Result<(), StoreError> {
    let table = dataset.table();
    let column = dataset.column();
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
             {column} TEXT NOT NULL,
             source TEXT NOT NULL,
             UNIQUE({column}, source)
         );"
    ))?;
    Ok(())
}

/// `*.txt` files in `dir`, sorted by name. A missing directory is empty.
fn list_sources(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "Source directory missing, table left empty");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_file(tx: &Transaction<'_>, dataset: Dataset, path: &Path) -> Result<(), StoreError> {
    let source = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut insert = tx.prepare(&format!(
        "INSERT OR IGNORE INTO {} ({}, source) VALUES (?1, ?2)",
        dataset.table(),
        dataset.column()
    ))?;

    // Breach lists are not reliably UTF-8, so lines are decoded lossily.
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    let mut inserted = 0usize;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        inserted += insert.execute(params![value, source])?;
    }

    tracing::debug!(dataset = %dataset, source = %source, inserted, "Source loaded");
    Ok(())
}
