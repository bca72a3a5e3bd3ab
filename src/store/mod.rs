//! Credential store subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     data_dir/*.txt → ingest.rs → SQLite file (write once)
//!
//! Per search:
//!     MatchQuery → query.rs (render SQL with quoted literal)
//!     → read-only connection on a blocking thread
//!     → Vec<CredentialMatch>
//! ```
//!
//! # Design Decisions
//! - Dataset is read-only for the lifetime of the process
//! - One short-lived read-only connection per operation; no pool to share
//! - Engine errors are typed here and kept out of HTTP responses

pub mod ingest;
pub mod query;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DatasetConfig;

pub use ingest::{ingest, IngestSummary};
pub use query::{Dataset, MatchQuery, FOLD_CASE};

/// Errors raised by the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database not found at {0}")]
    Missing(PathBuf),

    #[error("query engine error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("query task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One matched credential and the breach it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialMatch {
    pub matched_string: String,
    pub source: String,
}

/// Row count for a single breach source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub name: String,
    pub count: u64,
}

/// Read-only metadata about the loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_passwords: u64,
    pub total_usernames: u64,
    /// Password sources, largest first.
    pub sources: Vec<SourceCount>,
}

/// Handle to the on-disk credential database.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: Arc<PathBuf>,
}

impl CredentialStore {
    /// Open an existing store, checking that both tables are present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(StoreError::Missing(path));
        }

        let store = Self {
            path: Arc::new(path),
        };
        let conn = store.connect()?;
        for dataset in Dataset::ALL {
            conn.query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [dataset.table()],
                |row| row.get::<_, String>(0),
            )?;
        }
        Ok(store)
    }

    /// Open the configured store, ingesting the data directory first when
    /// the database is missing or `rebuild` is set.
    pub fn ensure(config: &DatasetConfig, rebuild: bool) -> Result<Self, StoreError> {
        if rebuild || !config.database_path.exists() {
            tracing::info!(
                data_dir = %config.data_dir.display(),
                database = %config.database_path.display(),
                "Building credential store"
            );
            let summary = ingest(&config.data_dir, &config.database_path)?;
            tracing::info!(
                passwords = summary.passwords,
                usernames = summary.usernames,
                "Credential store ready"
            );
        }
        Self::open(&config.database_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(self.path.as_path(), flags)?;
        register_fold_case(&conn)?;
        Ok(conn)
    }

    /// Run a match query on the calling thread.
    pub fn search_blocking(&self, query: &MatchQuery) -> Result<Vec<CredentialMatch>, StoreError> {
        let conn = self.connect()?;
        let sql = query.to_sql();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(CredentialMatch {
                matched_string: row.get(0)?,
                source: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Run a match query on the blocking pool.
    pub async fn search(&self, query: MatchQuery) -> Result<Vec<CredentialMatch>, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.search_blocking(&query)).await?
    }

    /// Collect dataset statistics on the calling thread.
    pub fn stats_blocking(&self) -> Result<DatasetStats, StoreError> {
        let conn = self.connect()?;
        let count = |dataset: Dataset| -> Result<u64, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", dataset.table()),
                [],
                |row| row.get(0),
            )
        };

        let total_passwords = count(Dataset::Passwords)?;
        let total_usernames = count(Dataset::Usernames)?;

        let mut stmt = conn.prepare(
            "SELECT source, COUNT(*) AS count FROM passwords GROUP BY source ORDER BY count DESC, source",
        )?;
        let sources = stmt
            .query_map([], |row| {
                Ok(SourceCount {
                    name: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DatasetStats {
            total_passwords,
            total_usernames,
            sources,
        })
    }

    /// Collect dataset statistics on the blocking pool.
    pub async fn stats(&self) -> Result<DatasetStats, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.stats_blocking()).await?
    }
}

/// Full Unicode lowercasing for case-insensitive matching.
fn register_fold_case(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.create_scalar_function(
        FOLD_CASE,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )
}
