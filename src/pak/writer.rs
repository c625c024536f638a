//! PACK archive creation.
//!
//! Layout policy: the 12-byte header sits at offset 0, payload bytes are
//! concatenated immediately after it in entry order with no padding (the
//! format addresses payloads by absolute offset, so alignment buys
//! nothing), and the entry table is written last at the end of the file
//! with the header pointing back at it. Input files are collected by a
//! recursive directory walk and sorted by relative name, so the same tree
//! always produces the same archive bytes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::io::{AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tracing::{debug, warn};

use crate::io::LocalFileReader;

use super::PakLimits;
use super::error::{CapacityError, PakResult};
use super::extractor::validate_entry_name;
use super::parser::PakParser;
use super::structures::{ENTRY_LEN, ENTRY_NAME_LEN, HEADER_LEN, PakEntry, PakHeader};

/// What a successful `create` accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateReport {
    pub entries: usize,
    pub payload_bytes: u64,
    pub archive_size: u64,
}

/// PACK archive write engine.
pub struct PakWriter {
    limits: PakLimits,
}

impl PakWriter {
    pub fn new() -> Self {
        Self::with_limits(PakLimits::default())
    }

    pub fn with_limits(limits: PakLimits) -> Self {
        Self { limits }
    }

    /// Build an archive at `output` from every regular file under
    /// `input_dir`.
    ///
    /// Entry names are `/`-separated paths relative to `input_dir` and
    /// must fit the fixed 56-byte name field. Refuses to overwrite an
    /// existing `output` file. Symlinks are skipped with a warning.
    pub async fn write_dir(&self, input_dir: &Path, output: &Path) -> PakResult<CreateReport> {
        let files = collect_files(input_dir).await?;
        if files.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("no files to pack under {}", input_dir.display()),
            )
            .into());
        }

        for (path, name) in &files {
            if name.len() > ENTRY_NAME_LEN {
                return Err(CapacityError::NameTooLong {
                    name: name.clone(),
                    max: ENTRY_NAME_LEN,
                }
                .into());
            }
            validate_entry_name(name)?;
            let size = fs::metadata(path).await?.len();
            if size > self.limits.max_entry_size || size > i32::MAX as u64 {
                return Err(CapacityError::PayloadTooLarge {
                    name: name.clone(),
                    size,
                    max: self.limits.max_entry_size.min(i32::MAX as u64),
                }
                .into());
            }
        }

        let mut out = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(output)
            .await?;

        // Header placeholder; the real header is written once the table
        // offset is known from the actual payload bytes.
        out.write_all(&[0u8; HEADER_LEN]).await?;

        let mut table = Vec::with_capacity(files.len() * ENTRY_LEN);
        let mut offset = HEADER_LEN as u64;
        let mut payload_bytes = 0u64;
        for (path, name) in &files {
            let data = fs::read(path).await?;
            if data.len() as u64 > self.limits.max_entry_size {
                return Err(CapacityError::PayloadTooLarge {
                    name: name.clone(),
                    size: data.len() as u64,
                    max: self.limits.max_entry_size,
                }
                .into());
            }
            out.write_all(&data).await?;

            let mut field = [0u8; ENTRY_NAME_LEN];
            field[..name.len()].copy_from_slice(name.as_bytes());
            let entry = PakEntry {
                name: field,
                offset: offset as i32,
                size: data.len() as i32,
            };
            table.extend_from_slice(&entry.to_bytes());

            debug!(name = %name, size = data.len(), offset, "packed entry");
            offset += data.len() as u64;
            payload_bytes += data.len() as u64;
        }

        let table_offset = offset;
        let table_end = table_offset + table.len() as u64;
        if table_end > i32::MAX as u64 {
            return Err(CapacityError::ArchiveTooLarge {
                max: i32::MAX as u64,
            }
            .into());
        }
        out.write_all(&table).await?;

        let header = PakHeader {
            table_offset: table_offset as i32,
            table_size: table.len() as i32,
        };
        out.seek(SeekFrom::Start(0)).await?;
        out.write_all(&header.to_bytes()).await?;
        out.flush().await?;

        Ok(CreateReport {
            entries: files.len(),
            payload_bytes,
            archive_size: table_end,
        })
    }

    /// Round-trip check: reopen a freshly written archive and make sure
    /// its header and entry table parse cleanly.
    pub async fn verify(&self, archive: &Path) -> PakResult<usize> {
        let reader = Arc::new(LocalFileReader::new(archive)?);
        let parser = PakParser::new(reader);
        let survey = parser.survey().await?;
        Ok(survey.entry_count)
    }
}

impl Default for PakWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk `input_dir` and return `(path, entry name)` pairs for every
/// regular file, sorted by entry name. Entry names use `/` separators on
/// every platform.
async fn collect_files(input_dir: &Path) -> std::io::Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    let mut stack = vec![(input_dir.to_path_buf(), String::new())];
    while let Some((dir, prefix)) = stack.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(dirent) = entries.next_entry().await? {
            let file_name = dirent.file_name().to_string_lossy().into_owned();
            let name = if prefix.is_empty() {
                file_name
            } else {
                format!("{prefix}/{file_name}")
            };

            let file_type = dirent.file_type().await?;
            if file_type.is_dir() {
                stack.push((dirent.path(), name));
            } else if file_type.is_file() {
                files.push((dirent.path(), name));
            } else {
                warn!(name = %name, "skipping non-regular file");
            }
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}
