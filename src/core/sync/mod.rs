//! # Sync Module
//!
//! The top-level pipeline for one file: duplicate validation, destination
//! pattern resolution, transfer, and index update.

pub mod pattern;
pub mod validator;

pub use pattern::{PatternResolver, SHORT_HASH_LEN};
pub use validator::DuplicateValidator;

use crate::core::file_ops::FileOps;
use crate::core::index::{FileIndexRecord, FileIndexStore};
use crate::core::search::FileSearch;
use crate::error::{Result, SyncError};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// How duplicates at the destination are detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateFilterStrategy {
    /// Hash the source once and look the checksum up in the file index
    Checksum,
    /// Compare the source byte-for-byte against destination files that
    /// share its extension
    BytePerByte,
}

/// Policy bundle for syncing one source file
#[derive(Debug, Clone)]
pub struct FileSyncCriteria {
    pub src_file: PathBuf,
    pub dest_dir: PathBuf,
    /// Move instead of copy
    pub remove_src: bool,
    /// Destination naming pattern, relative to `dest_dir`
    pub dest_pattern: String,
    pub include_duplicates: bool,
    pub duplicate_filter_strategy: DuplicateFilterStrategy,
}

/// What one sync call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The file was transferred to the resolved destination path
    Transferred(PathBuf),
    /// A duplicate was found; no transfer occurred
    SkippedDuplicate {
        found: PathBuf,
        /// Whether the source file was deleted because `remove_src` was set
        removed_src: bool,
    },
}

/// Orchestrates the sync pipeline for one file at a time
pub struct FileSync<'a> {
    file_ops: &'a FileOps,
    search: &'a FileSearch,
    store: &'a FileIndexStore,
}

impl<'a> FileSync<'a> {
    pub fn new(file_ops: &'a FileOps, search: &'a FileSearch, store: &'a FileIndexStore) -> Self {
        Self {
            file_ops,
            search,
            store,
        }
    }

    /// Sync one source file into the destination directory.
    ///
    /// A found duplicate stops the pipeline: the source is deleted when
    /// `remove_src` is set, and nothing is transferred either way.
    pub fn sync(&self, criteria: &FileSyncCriteria) -> Result<SyncOutcome> {
        let validator = DuplicateValidator::new(self.file_ops, self.search, self.store);

        match validator.validate(criteria) {
            Ok(()) => {}
            Err(SyncError::Duplicate { found, .. }) => {
                if criteria.remove_src {
                    self.file_ops.remove_file(&criteria.src_file)?;
                    warn!(
                        src = %criteria.src_file.display(),
                        found = %found.display(),
                        "Source file removal is enabled; deleted source already present at the destination"
                    );
                }
                return Ok(SyncOutcome::SkippedDuplicate {
                    found,
                    removed_src: criteria.remove_src,
                });
            }
            Err(e) => return Err(e.into()),
        }

        let dest = self.transfer_file(criteria)?;
        self.index_transferred_file(&dest);

        Ok(SyncOutcome::Transferred(dest))
    }

    fn transfer_file(&self, criteria: &FileSyncCriteria) -> Result<PathBuf> {
        let src_bytes = self.file_ops.read_file(&criteria.src_file, false)?;
        let metadata = self.file_ops.get_file_metadata(&src_bytes)?;

        let resolver = PatternResolver::new(self.file_ops);
        let relative = resolver.resolve(
            &src_bytes,
            &criteria.src_file,
            metadata.as_ref(),
            &criteria.dest_pattern,
        )?;

        let dest = criteria.dest_dir.join(relative);

        if criteria.remove_src {
            self.file_ops
                .move_file(&criteria.src_file, &dest)
                .map_err(|e| SyncError::MoveFailed {
                    src: criteria.src_file.clone(),
                    dest: dest.clone(),
                    reason: e.to_string(),
                })?;
        } else {
            self.file_ops
                .write_file(&src_bytes, &dest)
                .map_err(|e| SyncError::CopyFailed {
                    src: criteria.src_file.clone(),
                    dest: dest.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(dest)
    }

    /// Index the transferred file at its new location. Failures here are
    /// logged and swallowed: the transfer stands, and the next directory
    /// indexing pass repairs the missing record.
    fn index_transferred_file(&self, dest: &Path) {
        if let Err(e) = self.try_index_transferred_file(dest) {
            error!(
                path = %dest.display(),
                error = %e,
                "Failed to index synced file"
            );
        }
    }

    fn try_index_transferred_file(&self, dest: &Path) -> Result<()> {
        // The path may have been cached before transfer; read fresh
        let bytes = self.file_ops.read_file(dest, true)?;

        let metadata = self
            .file_ops
            .get_file_metadata(&bytes)?
            .map(|m| serde_json::to_string(&m))
            .transpose()
            .map_err(|e| {
                crate::error::MediaSyncError::Config(format!(
                    "failed to serialize metadata for {}: {e}",
                    dest.display()
                ))
            })?;

        let checksum = self.file_ops.calculate_checksum(&bytes)?;

        self.store.insert(&FileIndexRecord {
            path: dest.to_string_lossy().to_string(),
            checksum: checksum.value,
            checksum_algorithm: checksum.algorithm.as_str().to_string(),
            metadata,
            creation_date: Utc::now().to_rfc3339(),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::date_parser::DateParser;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        file_ops: FileOps,
        search: FileSearch,
        store: FileIndexStore,
    }

    impl Fixture {
        fn new(dir: &Path) -> Self {
            Self {
                file_ops: FileOps::new(DateParser::new()),
                search: FileSearch::new(),
                store: FileIndexStore::open(&dir.join("index.db")).unwrap(),
            }
        }

        fn sync_service(&self) -> FileSync<'_> {
            FileSync::new(&self.file_ops, &self.search, &self.store)
        }
    }

    fn criteria(src: &Path, dest: &Path) -> FileSyncCriteria {
        FileSyncCriteria {
            src_file: src.to_path_buf(),
            dest_dir: dest.to_path_buf(),
            remove_src: false,
            dest_pattern: "{src-name}{src-ext}".to_string(),
            include_duplicates: false,
            duplicate_filter_strategy: DuplicateFilterStrategy::Checksum,
        }
    }

    #[test]
    fn copies_and_indexes_a_new_file() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/photo.jpg");
        let dest_dir = temp.path().join("dest");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(&src, b"new photo").unwrap();

        let fixture = Fixture::new(temp.path());
        let outcome = fixture.sync_service().sync(&criteria(&src, &dest_dir)).unwrap();

        let expected_dest = dest_dir.join("photo.jpg");
        assert_eq!(outcome, SyncOutcome::Transferred(expected_dest.clone()));
        assert!(src.exists());
        assert_eq!(fs::read(&expected_dest).unwrap(), b"new photo");

        let checksum = fixture.file_ops.calculate_checksum(b"new photo").unwrap();
        let record = fixture.store.get_by_checksum(&checksum.value).unwrap().unwrap();
        assert_eq!(record.path, expected_dest.to_string_lossy());
    }

    #[test]
    fn moves_the_source_when_remove_src_is_set() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/photo.jpg");
        let dest_dir = temp.path().join("dest");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(&src, b"moved photo").unwrap();

        let fixture = Fixture::new(temp.path());
        let mut crit = criteria(&src, &dest_dir);
        crit.remove_src = true;

        let outcome = fixture.sync_service().sync(&crit).unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Transferred(dest_dir.join("photo.jpg"))
        );
        assert!(!src.exists());
        assert_eq!(fs::read(dest_dir.join("photo.jpg")).unwrap(), b"moved photo");
    }

    #[test]
    fn duplicate_is_skipped_without_write_or_insert() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/photo.jpg");
        let dest_dir = temp.path().join("dest");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(&src, b"already there").unwrap();

        let existing = dest_dir.join("existing.jpg");
        fs::write(&existing, b"already there").unwrap();

        let fixture = Fixture::new(temp.path());

        // Pretend the destination copy was indexed earlier
        let checksum = fixture.file_ops.calculate_checksum(b"already there").unwrap();
        fixture
            .store
            .insert(&FileIndexRecord {
                path: existing.to_string_lossy().to_string(),
                checksum: checksum.value,
                checksum_algorithm: checksum.algorithm.as_str().to_string(),
                metadata: None,
                creation_date: Utc::now().to_rfc3339(),
            })
            .unwrap();

        let outcome = fixture.sync_service().sync(&criteria(&src, &dest_dir)).unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::SkippedDuplicate {
                found: existing,
                removed_src: false,
            }
        );
        assert!(src.exists());
        assert!(!dest_dir.join("photo.jpg").exists());
        assert_eq!(fixture.store.get_all().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_with_remove_src_deletes_the_source() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/photo.jpg");
        let dest_dir = temp.path().join("dest");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(&src, b"dup content").unwrap();

        let existing = dest_dir.join("existing.jpg");
        fs::write(&existing, b"dup content").unwrap();

        let fixture = Fixture::new(temp.path());
        let checksum = fixture.file_ops.calculate_checksum(b"dup content").unwrap();
        fixture
            .store
            .insert(&FileIndexRecord {
                path: existing.to_string_lossy().to_string(),
                checksum: checksum.value,
                checksum_algorithm: checksum.algorithm.as_str().to_string(),
                metadata: None,
                creation_date: Utc::now().to_rfc3339(),
            })
            .unwrap();

        let mut crit = criteria(&src, &dest_dir);
        crit.remove_src = true;

        let outcome = fixture.sync_service().sync(&crit).unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::SkippedDuplicate {
                found: existing.clone(),
                removed_src: true,
            }
        );
        assert!(!src.exists());
        assert!(existing.exists());
    }

    #[test]
    fn unknown_pattern_token_fails_before_any_write() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/photo.jpg");
        let dest_dir = temp.path().join("dest");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(&src, b"content").unwrap();

        let fixture = Fixture::new(temp.path());
        let mut crit = criteria(&src, &dest_dir);
        crit.dest_pattern = "{yyyy}/{bogus}{src-ext}".to_string();

        let err = fixture.sync_service().sync(&crit).unwrap_err();
        assert!(err.to_string().contains("{bogus}"));

        // No partial file was written and nothing was indexed
        let written: Vec<_> = walkdir::WalkDir::new(&dest_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .collect();
        assert!(written.is_empty());
        assert!(fixture.store.get_all().unwrap().is_empty());
    }

    #[test]
    fn date_pattern_uses_filesystem_times_without_exif() {
        // Source has no EXIF; the date comes from filesystem times, so the
        // resolved path contains real date components rather than "na"
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/photo.jpg");
        let dest_dir = temp.path().join("dest");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(&src, b"dated").unwrap();

        let fixture = Fixture::new(temp.path());
        let mut crit = criteria(&src, &dest_dir);
        crit.dest_pattern = "{yyyy}/{mm}/{src-name}{src-ext}".to_string();

        let outcome = fixture.sync_service().sync(&crit).unwrap();

        let year = chrono::Datelike::year(&Utc::now()).to_string();
        match outcome {
            SyncOutcome::Transferred(dest) => {
                let relative = dest.strip_prefix(&dest_dir).unwrap();
                assert!(relative.starts_with(&year));
                assert!(dest.exists());
            }
            other => panic!("expected transfer, got {other:?}"),
        }
    }
}
