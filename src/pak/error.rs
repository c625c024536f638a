//! Typed error taxonomy for archive operations.
//!
//! Every failure an operation can hit maps to exactly one kind, so callers
//! (and tests) can match on the variant instead of parsing message text.

use std::path::PathBuf;

use thiserror::Error;

use crate::mem::ArenaError;

pub type PakResult<T> = Result<T, PakError>;

/// Top-level error for all archive operations.
#[derive(Debug, Error)]
pub enum PakError {
    /// Filesystem failures: path not found, permission denied, short
    /// read/write against the OS.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The archive bytes violate the structural invariants of the format.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The input exceeds a declared bound, or completing the operation
    /// would clobber existing output.
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    /// The estimate and allocation passes disagreed; aborts the operation.
    #[error(transparent)]
    Arena(#[from] ArenaError),

    #[error("{0} support is not implemented yet")]
    NotImplemented(&'static str),
}

/// Structural violations in the archive bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("bad magic code: expected \"PACK\", found {found:?}")]
    BadMagic { found: [u8; 4] },

    #[error("bad offset: {0}")]
    BadOffset(i32),

    #[error("bad size: {0}")]
    BadSize(i32),

    #[error("entry table ends at byte {table_end} but the archive is only {file_size} bytes")]
    TruncatedEntryTable { table_end: u64, file_size: u64 },

    #[error("entry {index} ({name}): payload truncated, declared {expected} bytes but only {got} are present")]
    TruncatedPayload {
        index: usize,
        name: String,
        expected: u64,
        got: u64,
    },

    #[error("duplicate entry name: {name}")]
    DuplicateName { name: String },

    #[error("entry name is not a safe relative path: {name:?}")]
    UnsafeName { name: String },
}

/// Declared-bound violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("entry name {name:?} exceeds the {max}-byte name field")]
    NameTooLong { name: String, max: usize },

    #[error("output path exceeds the {max}-byte limit: {path}")]
    PathTooLong { path: PathBuf, max: usize },

    #[error("payload for {name:?} is {size} bytes, over the {max}-byte limit")]
    PayloadTooLarge { name: String, size: u64, max: u64 },

    #[error("output directory already exists: {0}")]
    OutputDirExists(PathBuf),

    #[error("archive layout exceeds the maximum addressable offset of {max} bytes")]
    ArchiveTooLarge { max: u64 },
}
