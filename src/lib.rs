//! # rpak
//!
//! A toolkit for PACK game-asset container archives.
//!
//! This library reads and writes the classic PACK format: a 12-byte header
//! (magic `"PACK"`, entry-table offset, entry-table size), concatenated
//! payload bytes, and a table of fixed 64-byte entry records. It provides
//! `info`, `list`, `extract` and `create` operations with a typed error
//! taxonomy, so it is usable as a library and not only through the CLI.
//!
//! ## Memory strategy
//!
//! Archive sizes are fully declared by the header and entry table, so each
//! operation makes one measurement pass and then commits a single
//! right-sized [`Arena`] buffer: no growable-array reallocation, and
//! memory use is bounded by what the archive declares. See [`mem`].
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use rpak::{LocalFileReader, PakExtractor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new(Path::new("pak0.pak"))?);
//!     let extractor = PakExtractor::new(reader);
//!
//!     for entry in extractor.list().await? {
//!         println!("{}", entry.name_lossy());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod mem;
pub mod pak;

pub use cli::Cli;
pub use io::{LocalFileReader, ReadAt};
pub use mem::{Arena, ArenaError, ArenaSlot};
pub use pak::{
    CapacityError, CreateReport, ExtractReport, FormatError, PakEntry, PakError, PakExtractor,
    PakHeader, PakLimits, PakResult, PakSummary, PakWriter,
};
