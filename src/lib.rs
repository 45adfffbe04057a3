//! # media-sync
//!
//! Organizes digital media files: scans source directories, detects
//! duplicates against a destination collection, computes destination paths
//! from a naming pattern, transfers files, and records them in a lightweight
//! index so future runs detect duplicates without rereading every file.
//!
//! ## Architecture
//! The library is a core engine with a thin CLI on top:
//! - `core` - The file synchronization engine
//! - `error` - Typed errors per failure domain
//! - `cli` - Command-line interface

pub mod core;
pub mod error;

// Re-export commonly used types at the crate root
pub use error::{MediaSyncError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
