//! # Index Module
//!
//! The persisted file index and the directory indexer that reconciles it
//! against the live filesystem.
//!
//! Indexing is additive and corrective, not a full re-sync: records whose
//! file disappeared are removed, newly discovered files are inserted, and
//! files that are already known are never re-hashed. A record is "known"
//! purely because its path still resolves, so an in-place content edit does
//! not refresh the stored checksum.

pub mod store;

pub use store::{FileIndexRecord, FileIndexStore, DEFAULT_DB_FILE_NAME};

use crate::core::file_ops::FileOps;
use crate::core::search::{FileSearch, FileSearchCriteria};
use crate::error::{FileOpsError, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Policy bundle for one indexing run
#[derive(Debug, Clone)]
pub struct FileIndexCriteria {
    pub src_dir: PathBuf,
    pub file_extensions: Vec<String>,
    pub recursive: bool,
}

/// Counts of the changes one indexing pass made
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Stale records deleted because their file is gone
    pub removed: usize,
    /// Records inserted for newly discovered files
    pub added: usize,
}

/// Reconciles the file index store against the filesystem
pub struct DirectoryIndexer<'a> {
    file_ops: &'a FileOps,
    search: &'a FileSearch,
    store: &'a FileIndexStore,
}

impl<'a> DirectoryIndexer<'a> {
    pub fn new(file_ops: &'a FileOps, search: &'a FileSearch, store: &'a FileIndexStore) -> Self {
        Self {
            file_ops,
            search,
            store,
        }
    }

    /// Run one indexing pass: prune stale records, then index new files.
    /// Stale-record reconciliation completes before any insertion begins.
    pub fn index(&self, criteria: &FileIndexCriteria) -> Result<IndexOutcome> {
        let discovered = self.search.search(&FileSearchCriteria {
            src_dir: criteria.src_dir.clone(),
            file_extensions: criteria.file_extensions.clone(),
            recursive: criteria.recursive,
        })?;

        let existing = self.store.get_all()?;
        let (known_paths, removed) = self.prune_stale_records(&existing)?;
        let added = self.index_new_files(&discovered, &known_paths)?;

        info!(
            dir = %criteria.src_dir.display(),
            removed,
            added,
            "Directory indexing pass complete"
        );

        Ok(IndexOutcome { removed, added })
    }

    /// Partition existing records into kept and stale, deleting the stale
    /// ones. Only a missing file makes a record stale; other stat errors
    /// propagate.
    fn prune_stale_records(
        &self,
        existing: &[FileIndexRecord],
    ) -> Result<(HashSet<String>, usize)> {
        let mut known_paths = HashSet::new();
        let mut removed = 0;

        for record in existing {
            if is_file_missing(Path::new(&record.path))? {
                debug!(path = %record.path, "Removing stale index record");
                self.store.delete(&record.path)?;
                removed += 1;
            } else {
                known_paths.insert(record.path.clone());
            }
        }

        Ok((known_paths, removed))
    }

    fn index_new_files(
        &self,
        discovered: &[PathBuf],
        known_paths: &HashSet<String>,
    ) -> Result<usize> {
        let mut added = 0;

        for path in discovered {
            let path_str = path.to_string_lossy().to_string();
            if known_paths.contains(&path_str) {
                continue;
            }

            let bytes = self.file_ops.read_file(path, true)?;
            let checksum = self.file_ops.calculate_checksum(&bytes)?;

            let metadata = self
                .file_ops
                .get_file_metadata(&bytes)?
                .map(|m| serde_json::to_string(&m))
                .transpose()
                .map_err(|e| {
                    crate::error::MediaSyncError::Config(format!(
                        "failed to serialize metadata for {}: {e}",
                        path.display()
                    ))
                })?;

            self.store.insert(&FileIndexRecord {
                path: path_str,
                checksum: checksum.value,
                checksum_algorithm: checksum.algorithm.as_str().to_string(),
                metadata,
                creation_date: Utc::now().to_rfc3339(),
            })?;
            added += 1;
        }

        Ok(added)
    }
}

/// True when the path does not exist; other I/O failures propagate
fn is_file_missing(path: &Path) -> std::result::Result<bool, FileOpsError> {
    match fs::metadata(path) {
        Ok(_) => Ok(false),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(source) => Err(FileOpsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
