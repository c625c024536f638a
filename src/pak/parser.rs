//! Low-level PACK archive parser.
//!
//! Loading is a two-pass affair:
//!
//! 1. [`PakParser::survey`] decodes and validates the header, then scans
//!    the entry table once to count entries, sum payload sizes and find the
//!    largest payload. Nothing is allocated; the survey is what drives the
//!    arena estimate.
//! 2. [`PakParser::load_table`] carves a slot out of an already-committed
//!    arena and reads the raw entry table into it in one read.
//!
//! The returned [`PakArchive`] is a non-owning view: it holds the arena
//! slot of the raw table and decodes [`PakEntry`] records on demand against
//! a borrowed arena, so the arena stays the single owner of the memory.

use std::io;
use std::sync::Arc;

use tracing::debug;

use crate::io::ReadAt;
use crate::mem::{Arena, ArenaSlot};

use super::error::{FormatError, PakResult};
use super::structures::{ENTRY_LEN, HEADER_LEN, PakEntry, PakHeader};

/// Measurements gathered by the first pass over an archive.
///
/// Everything the second pass (and the extraction staging buffer) needs to
/// size its memory up front.
#[derive(Debug, Clone, Copy)]
pub struct PakSurvey {
    pub header: PakHeader,
    pub entry_count: usize,
    /// Sum of all declared payload sizes.
    pub total_payload: u64,
    /// Largest single declared payload.
    pub largest_payload: u64,
    /// Index of the entry with the largest payload.
    pub largest_index: usize,
    /// Total size of the archive file.
    pub archive_size: u64,
}

/// Loaded archive: header plus an entry-table view into the arena.
#[derive(Debug, Clone, Copy)]
pub struct PakArchive {
    pub header: PakHeader,
    table: ArenaSlot,
    entry_count: usize,
}

impl PakArchive {
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Decode the entry at `index` from the arena-resident table.
    ///
    /// Entries come back in on-disk order, which is significant and
    /// preserved. Panics if `index >= entry_count`.
    pub fn entry(&self, arena: &Arena, index: usize) -> PakEntry {
        let start = index * ENTRY_LEN;
        let mut record = [0u8; ENTRY_LEN];
        record.copy_from_slice(&arena.slice(self.table)[start..start + ENTRY_LEN]);
        PakEntry::from_bytes(&record)
    }

    /// Iterate all entries in on-disk order.
    pub fn entries<'a>(&'a self, arena: &'a Arena) -> impl Iterator<Item = PakEntry> + 'a {
        (0..self.entry_count).map(move |i| self.entry(arena, i))
    }
}

/// Low-level archive parser over a random-access source.
pub struct PakParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> PakParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// A reference to the underlying reader, for payload reads after the
    /// table is loaded.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    /// Read and validate the archive header.
    ///
    /// # Errors
    ///
    /// Any [`FormatError`] from [`PakHeader::from_bytes`], or
    /// [`FormatError::TruncatedEntryTable`] if the declared table runs past
    /// the end of the file.
    pub async fn read_header(&self) -> PakResult<PakHeader> {
        let mut buf = [0u8; HEADER_LEN];
        let n = self.reader.read_full_at(0, &mut buf).await?;
        if n < HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("archive is {n} bytes, shorter than the {HEADER_LEN}-byte header"),
            )
            .into());
        }

        let header = PakHeader::from_bytes(&buf)?;
        if header.table_end() > self.size {
            return Err(FormatError::TruncatedEntryTable {
                table_end: header.table_end(),
                file_size: self.size,
            }
            .into());
        }
        Ok(header)
    }

    /// Read and validate the entry record at `index`.
    ///
    /// Offset and size must be non-negative; the scan pass rejects the
    /// archive here rather than letting a negative field wrap later.
    pub async fn read_entry(&self, header: &PakHeader, index: usize) -> PakResult<PakEntry> {
        let mut buf = [0u8; ENTRY_LEN];
        let at = header.table_offset as u64 + (index * ENTRY_LEN) as u64;
        let n = self.reader.read_full_at(at, &mut buf).await?;
        if n < ENTRY_LEN {
            return Err(FormatError::TruncatedEntryTable {
                table_end: header.table_end(),
                file_size: self.size,
            }
            .into());
        }

        let entry = PakEntry::from_bytes(&buf);
        if entry.offset < 0 {
            return Err(FormatError::BadOffset(entry.offset).into());
        }
        if entry.size < 0 {
            return Err(FormatError::BadSize(entry.size).into());
        }
        Ok(entry)
    }

    /// First pass: header plus one scan over the entry table.
    pub async fn survey(&self) -> PakResult<PakSurvey> {
        let header = self.read_header().await?;
        let entry_count = header.entry_count();

        let mut total_payload = 0u64;
        let mut largest_payload = 0u64;
        let mut largest_index = 0usize;
        for index in 0..entry_count {
            let entry = self.read_entry(&header, index).await?;
            let size = entry.size as u64;
            total_payload += size;
            if size > largest_payload {
                largest_payload = size;
                largest_index = index;
            }
        }

        debug!(
            entries = entry_count,
            total_payload, largest_payload, "surveyed archive"
        );
        Ok(PakSurvey {
            header,
            entry_count,
            total_payload,
            largest_payload,
            largest_index,
            archive_size: self.size,
        })
    }

    /// Second pass: carve a table slot from the committed arena and read
    /// the raw entry table into it in one read.
    ///
    /// The arena must already be committed with at least
    /// `header.table_size` bytes of remaining capacity; the caller computed
    /// that from the survey.
    pub async fn load_table(&self, arena: &mut Arena, header: &PakHeader) -> PakResult<PakArchive> {
        let table_len = header.table_size as usize;
        let table = arena.alloc(table_len, 1)?;

        let n = self
            .reader
            .read_full_at(header.table_offset as u64, arena.slice_mut(table))
            .await?;
        if n < table_len {
            return Err(FormatError::TruncatedEntryTable {
                table_end: header.table_end(),
                file_size: self.size,
            }
            .into());
        }

        debug!(entries = header.entry_count(), "loaded entry table");
        Ok(PakArchive {
            header: *header,
            table,
            entry_count: header.entry_count(),
        })
    }
}
