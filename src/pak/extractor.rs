//! High-level archive operations: `info`, `list` and `extract`.
//!
//! Each operation owns its buffers (one arena per call), so separate
//! archives can be processed concurrently by separate extractors. Within
//! one operation everything is sequential: an operation runs to completion
//! or fails with a typed [`PakError`](super::error::PakError), and no
//! partial success is reported.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::io::ReadAt;
use crate::mem::Arena;

use super::PakLimits;
use super::error::{CapacityError, FormatError, PakResult};
use super::parser::{PakArchive, PakParser, PakSurvey};
use super::structures::{ENTRY_NAME_LEN, PakEntry};

/// What `info` reports about an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PakSummary {
    /// Total archive file size in bytes.
    pub archive_size: u64,
    /// Declared entry-table size in bytes.
    pub table_size: u64,
    pub entry_count: usize,
}

/// What a successful extraction accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractReport {
    pub files_written: usize,
    pub bytes_written: u64,
}

/// PACK archive read engine.
pub struct PakExtractor<R: ReadAt> {
    parser: PakParser<R>,
    limits: PakLimits,
}

impl<R: ReadAt> PakExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self::with_limits(reader, PakLimits::default())
    }

    pub fn with_limits(reader: Arc<R>, limits: PakLimits) -> Self {
        Self {
            parser: PakParser::new(reader),
            limits,
        }
    }

    /// Summarize the archive: file size, table size, entry count.
    pub async fn info(&self) -> PakResult<PakSummary> {
        let mut arena = Arena::new();
        let (survey, _) = self.load(&mut arena, 0).await?;
        Ok(PakSummary {
            archive_size: survey.archive_size,
            table_size: survey.header.table_size as u64,
            entry_count: survey.entry_count,
        })
    }

    /// Decode every entry, in on-disk order.
    pub async fn list(&self) -> PakResult<Vec<PakEntry>> {
        let mut arena = Arena::new();
        let (_, archive) = self.load(&mut arena, 0).await?;
        Ok(archive.entries(&arena).collect())
    }

    /// Extract every entry into a newly created `output_dir`.
    ///
    /// `output_dir` must not exist; extraction refuses to merge into or
    /// overwrite a previous run's output. Entries are written in table
    /// order, each one read at its declared offset and written byte-exact.
    /// The first failing entry aborts the operation with an error naming
    /// that entry; entries already written stay on disk inside the new
    /// directory.
    pub async fn extract_to_dir(&self, output_dir: &Path) -> PakResult<ExtractReport> {
        match fs::metadata(output_dir).await {
            Ok(_) => {
                return Err(CapacityError::OutputDirExists(output_dir.to_path_buf()).into());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut arena = Arena::new();
        let survey = self.parser.survey().await?;
        if survey.largest_payload > self.limits.max_entry_size {
            let entry = self
                .parser
                .read_entry(&survey.header, survey.largest_index)
                .await?;
            return Err(CapacityError::PayloadTooLarge {
                name: entry.name_lossy().into_owned(),
                size: survey.largest_payload,
                max: self.limits.max_entry_size,
            }
            .into());
        }

        let archive = self
            .commit_and_load(&mut arena, &survey, survey.largest_payload as usize)
            .await?;
        let entries: Vec<PakEntry> = archive.entries(&arena).collect();
        let names = self.checked_names(&entries, output_dir)?;

        // All validation passed; now touch the filesystem.
        fs::create_dir_all(output_dir).await?;
        let staging = arena.alloc(survey.largest_payload as usize, 1)?;

        let mut bytes_written = 0u64;
        for (index, (entry, name)) in entries.iter().zip(&names).enumerate() {
            let size = entry.size as usize;
            let dst = &mut arena.slice_mut(staging)[..size];
            let n = self
                .parser
                .reader()
                .read_full_at(entry.offset as u64, dst)
                .await?;
            if n < size {
                return Err(FormatError::TruncatedPayload {
                    index,
                    name: name.clone(),
                    expected: size as u64,
                    got: n as u64,
                }
                .into());
            }

            let out_path = output_dir.join(name);
            if let Some(parent) = out_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            let mut file = fs::File::create(&out_path).await?;
            file.write_all(&arena.slice(staging)[..size]).await?;
            file.flush().await?;

            debug!(name = %name, size, "extracted entry");
            bytes_written += size as u64;
        }

        Ok(ExtractReport {
            files_written: entries.len(),
            bytes_written,
        })
    }

    /// Validate entry names before anything is written: safe relative
    /// paths only, no duplicates, and the resulting output paths within
    /// the configured length limit.
    fn checked_names(&self, entries: &[PakEntry], output_dir: &Path) -> PakResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = entry.name_lossy().into_owned();
            validate_entry_name(&name)?;
            if !seen.insert(name.clone()) {
                return Err(FormatError::DuplicateName { name }.into());
            }
            let out_path = output_dir.join(&name);
            if out_path.as_os_str().len() > self.limits.max_path_len {
                return Err(CapacityError::PathTooLong {
                    path: out_path,
                    max: self.limits.max_path_len,
                }
                .into());
            }
            names.push(name);
        }
        Ok(names)
    }

    /// Commit the arena from the survey's measurements and load the table.
    /// `staging` is the extra bytes `extract` needs for payload staging;
    /// `info`/`list` pass 0.
    async fn commit_and_load(
        &self,
        arena: &mut Arena,
        survey: &PakSurvey,
        staging: usize,
    ) -> PakResult<PakArchive> {
        arena.begin_estimate();
        arena.add_estimate(survey.header.table_size as usize, 1)?;
        arena.add_estimate(staging, 1)?;
        arena.end_estimate()?;
        self.parser.load_table(arena, &survey.header).await
    }

    async fn load(&self, arena: &mut Arena, staging: usize) -> PakResult<(PakSurvey, PakArchive)> {
        let survey = self.parser.survey().await?;
        let archive = self.commit_and_load(arena, &survey, staging).await?;
        Ok((survey, archive))
    }
}

/// Reject entry names that could escape the output directory or that make
/// no sense as a relative path: empty names, absolute paths, backslashes,
/// and `.` / `..` or empty components.
pub(crate) fn validate_entry_name(name: &str) -> PakResult<()> {
    let unsafe_name = || FormatError::UnsafeName {
        name: name.to_string(),
    };

    if name.is_empty() || name.len() > ENTRY_NAME_LEN {
        return Err(unsafe_name().into());
    }
    if name.starts_with('/') || name.contains('\\') {
        return Err(unsafe_name().into());
    }
    for component in name.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(unsafe_name().into());
        }
    }
    Ok(())
}
