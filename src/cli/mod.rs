//! # CLI Module
//!
//! Command-line interface for the media sync engine.
//!
//! ## Usage
//! ```bash
//! # Reconcile the destination's file index with its contents
//! media-sync index ~/Photos --recursive
//!
//! # Sync one or more source directories into a destination
//! media-sync sync ~/Photos ~/Import ~/Downloads --recursive
//!
//! # Move instead of copy, with a custom layout
//! media-sync sync ~/Photos ~/Import --remove-src --dest-pattern "{yyyy}/{mm}/{dd}_{short-hash}{src-ext}"
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_sync::core::index::DEFAULT_DB_FILE_NAME;
use media_sync::core::{
    DateParser, DirectoryIndexer, DuplicateFilterStrategy, FileIndexCriteria, FileIndexStore,
    FileOps, FileSearch, FileSearchCriteria, FileSync, FileSyncCriteria, SyncOutcome,
};
use media_sync::error::{MediaSyncError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extensions included by default in index and sync runs
const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp", ".heic", ".mp4", ".mov", ".avi",
];

/// Default destination layout: year/month/day plus a content hash
const DEFAULT_DEST_PATTERN: &str = "{yyyy}/{mm}/{dd}_{short-hash}{src-ext}";

/// media-sync - Organize digital media files
#[derive(Parser, Debug)]
#[command(name = "media-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index media files in a destination directory.
    /// Useful when the index may be out of sync with the directory contents.
    Index {
        /// Destination directory to index
        dest: PathBuf,

        /// File extensions of the media files to include
        #[arg(long = "ext", num_args = 1.., default_values_t = default_extensions())]
        ext: Vec<String>,

        /// Traverse subdirectories recursively
        #[arg(long)]
        recursive: bool,
    },

    /// Sync media files from source directories into a destination directory
    Sync {
        /// Destination directory for the organized files
        dest: PathBuf,

        /// Source directories to search for media files
        #[arg(required = true)]
        src: Vec<PathBuf>,

        /// File extensions of the media files to include
        #[arg(long = "ext", num_args = 1.., default_values_t = default_extensions())]
        ext: Vec<String>,

        /// Search source directories recursively
        #[arg(long)]
        recursive: bool,

        /// Remove each source file once it is present at the destination
        #[arg(long)]
        remove_src: bool,

        /// Pattern for organizing files at the destination.
        /// Tokens: {yyyy} {yy} {mm} {dd} {short-hash} {src-name} {src-ext}
        #[arg(long, default_value = DEFAULT_DEST_PATTERN)]
        dest_pattern: String,

        /// Copy the file even if it already exists at the destination
        #[arg(long)]
        include_duplicates: bool,

        /// Strategy used to detect duplicates at the destination
        #[arg(long, value_enum, default_value = "checksum")]
        duplicate_filter_strategy: Strategy,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Checksum lookup in the file index
    Checksum,
    /// Byte per byte comparison against destination files
    Bpb,
}

impl From<Strategy> for DuplicateFilterStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Checksum => DuplicateFilterStrategy::Checksum,
            Strategy::Bpb => DuplicateFilterStrategy::BytePerByte,
        }
    }
}

fn default_extensions() -> Vec<String> {
    DEFAULT_MEDIA_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// Run the CLI
pub fn run() -> Result<()> {
    media_sync::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            dest,
            ext,
            recursive,
        } => run_index(dest, ext, recursive),
        Commands::Sync {
            dest,
            src,
            ext,
            recursive,
            remove_src,
            dest_pattern,
            include_duplicates,
            duplicate_filter_strategy,
        } => run_sync(
            dest,
            src,
            ext,
            recursive,
            remove_src,
            dest_pattern,
            include_duplicates,
            duplicate_filter_strategy.into(),
        ),
    }
}

fn run_index(dest: PathBuf, ext: Vec<String>, recursive: bool) -> Result<()> {
    validate_dest_directory(&dest)?;

    let term = Term::stderr();
    let store = FileIndexStore::open(&dest.join(DEFAULT_DB_FILE_NAME))?;
    let file_ops = FileOps::new(DateParser::new());
    let search = FileSearch::new();

    let indexer = DirectoryIndexer::new(&file_ops, &search, &store);
    let outcome = indexer.index(&FileIndexCriteria {
        src_dir: dest,
        file_extensions: ext,
        recursive,
    })?;

    term.write_line(&format!(
        "{} Index complete: {} added, {} stale removed",
        style("✓").green().bold(),
        style(outcome.added).cyan(),
        style(outcome.removed).cyan(),
    ))
    .ok();

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_sync(
    dest: PathBuf,
    src_dirs: Vec<PathBuf>,
    ext: Vec<String>,
    recursive: bool,
    remove_src: bool,
    dest_pattern: String,
    include_duplicates: bool,
    strategy: DuplicateFilterStrategy,
) -> Result<()> {
    validate_dest_directory(&dest)?;

    let term = Term::stderr();

    let db_path = dest.join(DEFAULT_DB_FILE_NAME);
    // A destination without a database has never been indexed
    let needs_indexing = !db_path.exists();

    let store = FileIndexStore::open(&db_path)?;
    let file_ops = FileOps::new(DateParser::new());
    let search = FileSearch::new();

    if needs_indexing {
        term.write_line(&format!(
            "{} Indexing destination for the first run...",
            style("→").dim()
        ))
        .ok();

        let indexer = DirectoryIndexer::new(&file_ops, &search, &store);
        indexer.index(&FileIndexCriteria {
            src_dir: dest.clone(),
            file_extensions: ext.clone(),
            recursive: true,
        })?;
    }

    let mut found_files = Vec::new();
    for src_dir in &src_dirs {
        let result = search.search(&FileSearchCriteria {
            src_dir: src_dir.clone(),
            file_extensions: ext.clone(),
            recursive,
        })?;
        found_files.extend(result);
    }
    debug!(count = found_files.len(), "Found source files");

    let progress = ProgressBar::new(found_files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );

    let sync_service = FileSync::new(&file_ops, &search, &store);

    let mut transferred = 0usize;
    let mut skipped = 0usize;
    let mut removed_sources = 0usize;

    for file in &found_files {
        progress.set_message(
            file.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );

        let outcome = sync_service.sync(&FileSyncCriteria {
            src_file: file.clone(),
            dest_dir: dest.clone(),
            remove_src,
            dest_pattern: dest_pattern.clone(),
            include_duplicates,
            duplicate_filter_strategy: strategy,
        })?;

        match outcome {
            SyncOutcome::Transferred(_) => transferred += 1,
            SyncOutcome::SkippedDuplicate { removed_src, .. } => {
                skipped += 1;
                if removed_src {
                    removed_sources += 1;
                }
            }
        }

        progress.inc(1);
    }

    progress.finish_and_clear();

    print_sync_summary(&term, found_files.len(), transferred, skipped, removed_sources);

    Ok(())
}

fn validate_dest_directory(dest: &Path) -> Result<()> {
    let metadata = std::fs::metadata(dest).map_err(|e| {
        MediaSyncError::Config(format!(
            "Failed to validate dest directory '{}': {e}",
            dest.display()
        ))
    })?;

    if !metadata.is_dir() {
        return Err(MediaSyncError::Config(format!(
            "Provided path '{}' is not a directory",
            dest.display()
        )));
    }

    Ok(())
}

fn print_sync_summary(
    term: &Term,
    processed: usize,
    transferred: usize,
    skipped: usize,
    removed_sources: usize,
) {
    term.write_line("").ok();
    term.write_line(&format!("{} Sync Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files processed",
        style(processed).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} files transferred",
        style(transferred).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicates skipped",
        style(skipped).cyan()
    ))
    .ok();

    if removed_sources > 0 {
        term.write_line(&format!(
            "  {} duplicate sources removed",
            style(removed_sources).yellow()
        ))
        .ok();
    }
}
