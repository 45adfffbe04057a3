//! # File Operations Module
//!
//! Byte-level primitives shared by the whole pipeline: checksum computation,
//! cached file reads, EXIF metadata extraction, file transfer and path
//! helpers.
//!
//! ## Read cache
//! `FileOps` owns a process-wide read cache keyed by path. The cache has no
//! eviction policy; callers that rewrite a file at the same path within one
//! process must either pass `force_reread` or clear the cache explicitly.

use crate::core::date_parser::DateParser;
use crate::error::FileOpsError;
use chrono::{DateTime, Utc};
use exif::{In, Reader, Tag, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::debug;

/// Checksum algorithm used for file content hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChecksumAlgorithm {
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Sha512 => "sha512",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "sha512" => ChecksumAlgorithm::Sha512,
            _ => ChecksumAlgorithm::Sha256,
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content checksum of a whole file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChecksum {
    /// Hex-encoded digest
    pub value: String,
    pub algorithm: ChecksumAlgorithm,
}

/// Filesystem timestamps for a file
#[derive(Debug, Clone)]
pub struct FileStats {
    pub len: u64,
    /// Last modification time
    pub modified: Option<DateTime<Utc>>,
    /// Creation (birth) time; unavailable on some filesystems
    pub created: Option<DateTime<Utc>>,
}

/// Parsed EXIF date fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExifData {
    #[serde(rename = "DateTimeOriginal", skip_serializing_if = "Option::is_none")]
    pub date_time_original: Option<DateTime<Utc>>,
    #[serde(rename = "DateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
}

/// Structured metadata persisted alongside an index record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(rename = "Exif")]
    pub exif: FileExifData,
}

/// Ordered list of recognized EXIF date-string shapes. First match wins.
fn date_shapes() -> &'static Vec<(Regex, &'static str)> {
    static SHAPES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    SHAPES.get_or_init(|| {
        [
            // ISO-like with dashes in the time part 'YYYY-MM-DDThh-mm-ss'
            (r"^\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}$", "yyyy-MM-dd'T'HH-mm-ss"),
            // Traditional EXIF 'YYYY:MM:DD hh:mm:ss'
            (r"^\d{4}:\d{2}:\d{2} \d{2}:\d{2}:\d{2}$", "yyyy:MM:dd HH:mm:ss"),
            // EXIF with a stray space after the year 'YYYY: MM:DD hh:mm:ss'
            (r"^\d{4}: \d{2}:\d{2} \d{2}:\d{2}:\d{2}$", "yyyy: MM:dd HH:mm:ss"),
            // Same, without leading zeroes 'YYYY: M:D hh:mm:ss'
            (r"^\d{4}: ?\d{1,2}: ?\d{1,2} \d{2}:\d{2}:\d{2}$", "yyyy: M:d HH:mm:ss"),
            // Basic ISO 'YYYY-MM-DDTHH:MM:SS'
            (r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}$", "yyyy-MM-dd'T'HH:mm:ss"),
            // ISO with milliseconds
            (r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}$", "yyyy-MM-dd'T'HH:mm:ss.SSS"),
            // ISO with UTC marker
            (r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$", "yyyy-MM-dd'T'HH:mm:ssX"),
            // Slash-delimited with time
            (r"^\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}$", "yyyy/MM/dd HH:mm:ss"),
            // Slash-delimited date only
            (r"^\d{4}/\d{2}/\d{2}$", "yyyy/MM/dd"),
        ]
        .into_iter()
        .map(|(re, fmt)| (Regex::new(re).expect("static regex"), fmt))
        .collect()
    })
}

/// File operation primitives with a process-wide read cache.
pub struct FileOps {
    date_parser: DateParser,
    read_cache: Mutex<HashMap<PathBuf, Arc<[u8]>>>,
}

impl FileOps {
    pub fn new(date_parser: DateParser) -> Self {
        Self {
            date_parser,
            read_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Hash the full byte content. SHA-512 is preferred on 64-bit targets
    /// where it outperforms SHA-256.
    pub fn calculate_checksum(&self, bytes: &[u8]) -> Result<FileChecksum, FileOpsError> {
        let algorithm = if cfg!(target_pointer_width = "64") {
            ChecksumAlgorithm::Sha512
        } else {
            ChecksumAlgorithm::Sha256
        };

        let value = match algorithm {
            ChecksumAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                hasher.update(bytes);
                hex_encode(&hasher.finalize())
            }
            ChecksumAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(bytes);
                hex_encode(&hasher.finalize())
            }
        };

        Ok(FileChecksum { value, algorithm })
    }

    /// Checksum truncated to `length` hex characters
    pub fn get_short_hash(&self, bytes: &[u8], length: usize) -> Result<String, FileOpsError> {
        let checksum = self.calculate_checksum(bytes)?;
        let mut value = checksum.value;
        value.truncate(length);
        Ok(value)
    }

    /// Read a file through the process-wide cache. `force_reread` bypasses
    /// the cache and repopulates it.
    pub fn read_file(&self, path: &Path, force_reread: bool) -> Result<Arc<[u8]>, FileOpsError> {
        if !force_reread {
            let cache = self.lock_cache();
            if let Some(bytes) = cache.get(path) {
                return Ok(Arc::clone(bytes));
            }
        }

        let bytes: Arc<[u8]> = fs::read(path)
            .map_err(|source| FileOpsError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .into();

        self.lock_cache()
            .insert(path.to_path_buf(), Arc::clone(&bytes));

        Ok(bytes)
    }

    /// Drop every cached buffer
    pub fn clear_read_cache(&self) {
        self.lock_cache().clear();
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<[u8]>>> {
        self.read_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_file_stats(&self, path: &Path) -> Result<FileStats, FileOpsError> {
        let metadata = fs::metadata(path).map_err(|source| FileOpsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(FileStats {
            len: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            created: metadata.created().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Extract `DateTimeOriginal` and `DateTime` from an embedded EXIF block.
    ///
    /// A container that cannot be read is an error only when
    /// `throw_on_error` is set; otherwise it is logged and reported absent.
    /// A readable container with no fields at all is also absent.
    pub fn get_exif_data(
        &self,
        bytes: &[u8],
        throw_on_error: bool,
    ) -> Result<Option<FileExifData>, FileOpsError> {
        let mut cursor = Cursor::new(bytes);
        let exif = match Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(e) if throw_on_error => {
                return Err(FileOpsError::ExifRead {
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                debug!(error = %e, "Failed to read EXIF data");
                return Ok(None);
            }
        };

        if exif.fields().next().is_none() {
            return Ok(None);
        }

        Ok(Some(FileExifData {
            date_time_original: self.extract_exif_date(&exif, Tag::DateTimeOriginal),
            date_time: self.extract_exif_date(&exif, Tag::DateTime),
        }))
    }

    /// EXIF wrapped in the persisted metadata envelope, or `None` when the
    /// buffer carries no readable EXIF block.
    pub fn get_file_metadata(&self, bytes: &[u8]) -> Result<Option<FileMetadata>, FileOpsError> {
        Ok(self
            .get_exif_data(bytes, false)?
            .map(|exif| FileMetadata { exif }))
    }

    fn extract_exif_date(&self, exif: &exif::Exif, tag: Tag) -> Option<DateTime<Utc>> {
        let field = exif.get_field(tag, In::PRIMARY)?;
        let raw = normalize_tag_value(&field.value)?;

        match self.parse_exif_date_string(&raw) {
            Ok(date) => Some(date),
            Err(e) => {
                debug!(%tag, input = %raw, error = %e, "Failed to parse EXIF date field");
                None
            }
        }
    }

    /// Run a raw tag description through the ordered shape table.
    fn parse_exif_date_string(&self, input: &str) -> Result<DateTime<Utc>, FileOpsError> {
        let now = Utc::now();

        for (shape, format) in date_shapes() {
            if shape.is_match(input) {
                return Ok(self.date_parser.parse(input, format, now)?);
            }
        }

        Err(FileOpsError::UnrecognizedDateFormat {
            input: input.to_string(),
        })
    }

    /// File extension including the leading dot, or an empty string
    pub fn get_file_extension(&self, path: &Path) -> String {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!(".{ext}"),
            None => String::new(),
        }
    }

    /// File name with or without its extension
    pub fn get_file_name(&self, path: &Path, include_extension: bool) -> Option<String> {
        let name = if include_extension {
            path.file_name()
        } else {
            path.file_stem()
        };
        name.and_then(|n| n.to_str()).map(|n| n.to_string())
    }

    /// Move a file, creating the destination directory tree. Cross-device
    /// renames fall back to copy-then-delete with a size verification before
    /// the source is removed; any other rename error propagates.
    pub fn move_file(&self, src: &Path, dest: &Path) -> Result<(), FileOpsError> {
        self.create_parent_dirs(dest)?;

        match fs::rename(src, dest) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                let io_err = |source| FileOpsError::Io {
                    path: dest.to_path_buf(),
                    source,
                };

                let src_len = fs::metadata(src)
                    .map_err(|source| FileOpsError::Io {
                        path: src.to_path_buf(),
                        source,
                    })?
                    .len();
                fs::copy(src, dest).map_err(io_err)?;

                let dest_len = fs::metadata(dest).map_err(io_err)?.len();
                if dest_len != src_len {
                    // Incomplete copy: keep the source, drop the partial dest
                    let _ = fs::remove_file(dest);
                    return Err(io_err(std::io::Error::other(format!(
                        "copy verification failed: source {} bytes, dest {} bytes",
                        src_len, dest_len
                    ))));
                }

                self.remove_file(src)
            }
            Err(source) => Err(FileOpsError::Io {
                path: src.to_path_buf(),
                source,
            }),
        }
    }

    /// Write bytes, creating the destination directory tree
    pub fn write_file(&self, bytes: &[u8], dest: &Path) -> Result<(), FileOpsError> {
        self.create_parent_dirs(dest)?;

        fs::write(dest, bytes).map_err(|source| FileOpsError::Io {
            path: dest.to_path_buf(),
            source,
        })
    }

    pub fn remove_file(&self, path: &Path) -> Result<(), FileOpsError> {
        fs::remove_file(path).map_err(|source| FileOpsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn create_parent_dirs(&self, dest: &Path) -> Result<(), FileOpsError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| FileOpsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// True iff lengths and all bytes match; empty buffers compare equal
    pub fn compare_bytes_equal(&self, a: &[u8], b: &[u8]) -> bool {
        a.len() == b.len() && a == b
    }
}

/// Normalize the polymorphic EXIF tag value shapes to one date string:
/// a plain ASCII string, a single-element list, or a date+time pair stored
/// as two ASCII components.
fn normalize_tag_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref components) = value {
        let strings: Vec<&str> = components
            .iter()
            .filter_map(|bytes| std::str::from_utf8(bytes).ok())
            .map(|s| s.trim_end_matches('\0').trim())
            .filter(|s| !s.is_empty())
            .collect();

        return match strings.as_slice() {
            [single] => Some((*single).to_string()),
            [date, time] => Some(format!("{date} {time}")),
            _ => None,
        };
    }

    None
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
