//! SQLite-backed file index store.

use crate::error::StoreError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default database file name, conventionally placed inside the
/// destination directory.
pub const DEFAULT_DB_FILE_NAME: &str = "media-sync.db";

/// One row of the file index: a filesystem path mapped to its content
/// checksum, optional metadata JSON and the time it was indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIndexRecord {
    /// Unique key; at most one record per filesystem path
    pub path: String,
    pub checksum: String,
    pub checksum_algorithm: String,
    /// Serialized `FileMetadata`, absent when the file had none
    pub metadata: Option<String>,
    /// RFC 3339 timestamp of when the record was created
    pub creation_date: String,
}

/// Persisted mapping from file path to checksum and metadata
pub struct FileIndexStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl FileIndexStore {
    /// Open or create the index database, creating the schema if absent
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS file_index (
                path TEXT PRIMARY KEY,
                checksum TEXT NOT NULL,
                checksum_algorithm TEXT NOT NULL,
                metadata TEXT NULL DEFAULT NULL,
                creation_date TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        // Duplicate detection looks records up by checksum
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_file_index_checksum ON file_index(checksum)",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    /// Path of the underlying database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn insert(&self, record: &FileIndexRecord) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;

        conn.execute(
            "INSERT INTO file_index
             (path, checksum, checksum_algorithm, metadata, creation_date)
             VALUES (?, ?, ?, ?, ?)",
            params![
                record.path,
                record.checksum,
                record.checksum_algorithm,
                record.metadata,
                record.creation_date,
            ],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    pub fn delete(&self, path: &str) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;

        conn.execute("DELETE FROM file_index WHERE path = ?", [path])
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    pub fn get_all(&self) -> Result<Vec<FileIndexRecord>, StoreError> {
        let conn = self.lock_conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT path, checksum, checksum_algorithm, metadata, creation_date
                 FROM file_index",
            )
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let records = stmt
            .query_map([], row_to_record)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(records)
    }

    pub fn get_by_checksum(
        &self,
        checksum: &str,
    ) -> Result<Option<FileIndexRecord>, StoreError> {
        let conn = self.lock_conn()?;

        conn.query_row(
            "SELECT path, checksum, checksum_algorithm, metadata, creation_date
             FROM file_index WHERE checksum = ?",
            [checksum],
            row_to_record,
        )
        .optional()
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| {
            StoreError::QueryFailed(format!(
                "index database lock poisoned at {}",
                self.db_path.display()
            ))
        })
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<FileIndexRecord> {
    Ok(FileIndexRecord {
        path: row.get(0)?,
        checksum: row.get(1)?,
        checksum_algorithm: row.get(2)?,
        metadata: row.get(3)?,
        creation_date: row.get(4)?,
    })
}
