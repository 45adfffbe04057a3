//! # Core Module
//!
//! The CLI-agnostic file synchronization engine.
//!
//! ## Modules
//! - `date_parser` - Token-pattern date parsing against a reference date
//! - `file_ops` - Checksums, cached reads, EXIF extraction, file transfer
//! - `search` - Suffix-matching directory listing
//! - `index` - The persisted file index and the directory indexer
//! - `sync` - Duplicate validation, pattern resolution, the sync pipeline

pub mod date_parser;
pub mod file_ops;
pub mod index;
pub mod search;
pub mod sync;

// Re-export commonly used types
pub use date_parser::DateParser;
pub use file_ops::{ChecksumAlgorithm, FileChecksum, FileExifData, FileMetadata, FileOps};
pub use index::{DirectoryIndexer, FileIndexCriteria, FileIndexRecord, FileIndexStore};
pub use search::{FileSearch, FileSearchCriteria};
pub use sync::{DuplicateFilterStrategy, FileSync, FileSyncCriteria, SyncOutcome};
