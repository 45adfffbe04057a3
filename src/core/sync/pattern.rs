//! Destination pattern resolution.
//!
//! A pattern is a relative path template with brace tokens, e.g.
//! `{yyyy}/{mm}/{dd}_{short-hash}{src-ext}`. Date tokens resolve from the
//! file's content creation date; when no date can be determined they resolve
//! to the literal `"na"`.

use crate::core::file_ops::{FileMetadata, FileOps};
use crate::error::SyncError;
use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::error;

/// Number of hex characters kept by `{short-hash}`
pub const SHORT_HASH_LEN: usize = 8;

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\{[^}]+\}").expect("static regex"))
}

/// Resolves destination patterns for one source file
pub struct PatternResolver<'a> {
    file_ops: &'a FileOps,
}

impl<'a> PatternResolver<'a> {
    pub fn new(file_ops: &'a FileOps) -> Self {
        Self { file_ops }
    }

    /// Resolve every token in `pattern`, left to right. An unrecognized
    /// token fails the whole resolution naming the token.
    pub fn resolve(
        &self,
        src_bytes: &[u8],
        src_path: &Path,
        metadata: Option<&FileMetadata>,
        pattern: &str,
    ) -> Result<String, SyncError> {
        let tokens: Vec<String> = token_regex()
            .find_iter(pattern)
            .map(|m| m.as_str().to_string())
            .collect();

        // The creation date lookup may hit the filesystem; do it at most once
        let mut creation_date: Option<Option<DateTime<Utc>>> = None;

        let mut resolved = pattern.to_string();
        for token in tokens {
            let replacement = match token.as_str() {
                "{yyyy}" | "{yy}" | "{mm}" | "{dd}" => {
                    let date = *creation_date
                        .get_or_insert_with(|| self.content_creation_date(src_path, metadata));
                    match date {
                        Some(date) => format_date_token(&token, date),
                        None => "na".to_string(),
                    }
                }
                "{short-hash}" => self.file_ops.get_short_hash(src_bytes, SHORT_HASH_LEN)?,
                "{src-name}" => self
                    .file_ops
                    .get_file_name(src_path, false)
                    .unwrap_or_else(|| "na".to_string()),
                "{src-ext}" => self.file_ops.get_file_extension(src_path),
                _ => return Err(SyncError::UnknownPatternToken { token }),
            };

            resolved = resolved.replacen(&token, &replacement, 1);
        }

        Ok(resolved)
    }

    /// Content creation date: EXIF DateTimeOriginal, else EXIF DateTime,
    /// else the earlier of the filesystem modify and birth times. Filesystems
    /// without a reliable birth time degrade to whichever is available.
    fn content_creation_date(
        &self,
        src_path: &Path,
        metadata: Option<&FileMetadata>,
    ) -> Option<DateTime<Utc>> {
        if let Some(metadata) = metadata {
            if let Some(date) = metadata.exif.date_time_original {
                return Some(date);
            }
            if let Some(date) = metadata.exif.date_time {
                return Some(date);
            }
        }

        match self.file_ops.get_file_stats(src_path) {
            Ok(stats) => match (stats.modified, stats.created) {
                (Some(modified), Some(created)) => Some(modified.min(created)),
                (modified, created) => modified.or(created),
            },
            Err(e) => {
                error!(path = %src_path.display(), error = %e, "Failed to read file stats");
                None
            }
        }
    }
}

fn format_date_token(token: &str, date: DateTime<Utc>) -> String {
    match token {
        "{yyyy}" => date.year().to_string(),
        "{yy}" => format!("{:02}", date.year() % 100),
        "{mm}" => format!("{:02}", date.month()),
        // "{dd}" is the only remaining date token
        _ => format!("{:02}", date.day()),
    }
}
