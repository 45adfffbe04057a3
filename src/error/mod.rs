//! # Error Module
//!
//! Error types for the media sync engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Keep the duplicate signal typed** - a found duplicate is a control
//!   signal the orchestrator consumes, not a hard failure

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum MediaSyncError {
    #[error("Date parsing error: {0}")]
    DateParse(#[from] DateParseError),

    #[error("File operation error: {0}")]
    FileOps(#[from] FileOpsError),

    #[error("File search error: {0}")]
    Search(#[from] SearchError),

    #[error("Index store error: {0}")]
    Store(#[from] StoreError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors from the date parser
#[derive(Error, Debug)]
pub enum DateParseError {
    #[error("Could not parse date string '{input}' with format '{format}'")]
    Unparseable { input: String, format: String },

    #[error("Parsed date string '{input}' is not a valid calendar date")]
    InvalidDate { input: String },
}

/// Errors from low-level file operations
#[derive(Error, Debug)]
pub enum FileOpsError {
    #[error("Failed to calculate file checksum: {reason}")]
    Checksum { reason: String },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read EXIF container: {reason}")]
    ExifRead { reason: String },

    #[error("Unrecognized date format: {input}")]
    UnrecognizedDateFormat { input: String },

    #[error(transparent)]
    DateParse(#[from] DateParseError),
}

/// Errors that occur while listing files
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Provided path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the file index database
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open index database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),
}

/// Errors raised while syncing a single file
#[derive(Error, Debug)]
pub enum SyncError {
    /// Control signal: the source already exists at the destination.
    /// The orchestrator consumes this to decide skip-vs-delete-source.
    #[error("Source file '{src}' already exists at the destination '{found}'. Skipping synchronization.")]
    Duplicate { src: PathBuf, found: PathBuf },

    #[error("Unsupported destination pattern token `{token}`")]
    UnknownPatternToken { token: String },

    #[error("Failed to move file from {src} to {dest}! The file has not been moved: {reason}")]
    MoveFailed {
        src: PathBuf,
        dest: PathBuf,
        reason: String,
    },

    #[error("Failed to copy file from {src} to {dest}! The file has not been copied: {reason}")]
    CopyFailed {
        src: PathBuf,
        dest: PathBuf,
        reason: String,
    },

    #[error(transparent)]
    FileOps(#[from] FileOpsError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MediaSyncError>;
