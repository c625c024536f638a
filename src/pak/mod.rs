//! PACK archive parsing, extraction and creation.
//!
//! ## Architecture
//!
//! The module is organized into five components:
//!
//! - [`structures`]: on-disk records (header, entry) and their binary codec
//! - [`parser`]: two-pass loading of the entry table into an [`Arena`](crate::mem::Arena)
//! - [`extractor`]: high-level `info` / `list` / `extract` operations
//! - [`writer`]: archive creation from a directory tree
//! - [`error`]: the typed failure taxonomy shared by all of the above
//!
//! ## PACK format overview
//!
//! An archive is a 12-byte header (`"PACK"` magic plus the offset and byte
//! length of the entry table), concatenated payload bytes, and a table of
//! 64-byte entry records (56-byte NUL-padded name, payload offset, payload
//! size). All integers are little-endian and signed 32-bit.
//!
//! ## Loading strategy
//!
//! Every operation loads an archive the same way: a first pass decodes the
//! header and scans the entry table to learn exactly how much memory the
//! operation needs, then a single arena buffer of that size is committed
//! and the table is decoded into it. No growable-array reallocation, and
//! memory use is bounded by what the archive declares.

pub mod error;
pub mod extractor;
pub mod parser;
pub mod structures;
pub mod writer;

pub use error::{CapacityError, FormatError, PakError, PakResult};
pub use extractor::{ExtractReport, PakExtractor, PakSummary};
pub use parser::{PakArchive, PakParser, PakSurvey};
pub use structures::{PakEntry, PakHeader};
pub use writer::{CreateReport, PakWriter};

/// Configurable ceilings for archive operations.
///
/// The defaults match the classic tool limits: single payloads up to
/// 25 MiB and output paths up to 1024 bytes. Both exist to bound staging
/// memory and filesystem path construction, not the format itself.
#[derive(Debug, Clone, Copy)]
pub struct PakLimits {
    /// Largest single payload, in bytes, `extract` will stage and `create`
    /// will accept.
    pub max_entry_size: u64,
    /// Longest output path, in bytes, `extract` will construct.
    pub max_path_len: usize,
}

impl Default for PakLimits {
    fn default() -> Self {
        Self {
            max_entry_size: 25 * 1024 * 1024,
            max_path_len: 1024,
        }
    }
}
