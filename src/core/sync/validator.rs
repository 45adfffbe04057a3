//! Duplicate detection for a single source file.

use super::{DuplicateFilterStrategy, FileSyncCriteria};
use crate::core::file_ops::FileOps;
use crate::core::index::FileIndexStore;
use crate::core::search::{FileSearch, FileSearchCriteria};
use crate::error::SyncError;
use std::path::PathBuf;

/// Decides whether a candidate source file already exists at the destination
pub struct DuplicateValidator<'a> {
    file_ops: &'a FileOps,
    search: &'a FileSearch,
    store: &'a FileIndexStore,
}

impl<'a> DuplicateValidator<'a> {
    pub fn new(file_ops: &'a FileOps, search: &'a FileSearch, store: &'a FileIndexStore) -> Self {
        Self {
            file_ops,
            search,
            store,
        }
    }

    /// Fails with [`SyncError::Duplicate`] when a duplicate exists and
    /// duplicates are not included; no-ops immediately otherwise.
    pub fn validate(&self, criteria: &FileSyncCriteria) -> Result<(), SyncError> {
        if criteria.include_duplicates {
            return Ok(());
        }

        let found = match criteria.duplicate_filter_strategy {
            DuplicateFilterStrategy::Checksum => self.search_by_checksum(criteria)?,
            DuplicateFilterStrategy::BytePerByte => self.search_byte_per_byte(criteria)?,
        };

        match found {
            Some(found) => Err(SyncError::Duplicate {
                src: criteria.src_file.clone(),
                found,
            }),
            None => Ok(()),
        }
    }

    /// O(1) store lookup after one hash computation
    fn search_by_checksum(
        &self,
        criteria: &FileSyncCriteria,
    ) -> Result<Option<PathBuf>, SyncError> {
        let bytes = self.file_ops.read_file(&criteria.src_file, false)?;
        let checksum = self.file_ops.calculate_checksum(&bytes)?;

        Ok(self
            .store
            .get_by_checksum(&checksum.value)?
            .map(|record| PathBuf::from(record.path)))
    }

    /// Scan destination files sharing the source's extension, same-named
    /// candidates first, comparing byte-for-byte until the first exact match.
    fn search_byte_per_byte(
        &self,
        criteria: &FileSyncCriteria,
    ) -> Result<Option<PathBuf>, SyncError> {
        let src_bytes = self.file_ops.read_file(&criteria.src_file, false)?;
        let src_name = self.file_ops.get_file_name(&criteria.src_file, true);

        let mut candidates = self.search.search(&FileSearchCriteria {
            src_dir: criteria.dest_dir.clone(),
            file_extensions: vec![self.file_ops.get_file_extension(&criteria.src_file)],
            recursive: true,
        })?;

        // A file with the same name is the most likely duplicate; compare
        // those first. The sort is stable so other candidates keep their
        // directory-listing order.
        candidates.sort_by_key(|path| self.file_ops.get_file_name(path, true) != src_name);

        for candidate in candidates {
            if candidate == criteria.src_file {
                continue;
            }

            // Differing sizes can never be byte-equal; skip without reading
            let stats = self.file_ops.get_file_stats(&candidate)?;
            if stats.len as usize != src_bytes.len() {
                continue;
            }

            let candidate_bytes = self.file_ops.read_file(&candidate, false)?;
            if self.file_ops.compare_bytes_equal(&src_bytes, &candidate_bytes) {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}
