//! # media-sync CLI
//!
//! Command-line interface for the media sync engine.
//!
//! ## Usage
//! ```bash
//! media-sync index ~/Photos --recursive
//! media-sync sync ~/Photos ~/Import --remove-src
//! ```

mod cli;

use media_sync::Result;

fn main() -> Result<()> {
    cli::run()
}
