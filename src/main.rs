//! Main entry point for the rpak CLI application.
//!
//! This binary provides a command-line interface over the PACK archive
//! engine: summary, listing, extraction and creation. WAD and LMP remain
//! stubs that report not-implemented.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use rpak::cli::{Cli, Command, PackCommand};
use rpak::pak::PakError;
use rpak::{LocalFileReader, PakExtractor, PakWriter};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to the matching archive
/// operation. Any typed engine error is printed and turns into a non-zero
/// exit status.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Pack { command } => match command {
            PackCommand::Info { input } => pack_info(&input).await?,
            PackCommand::List { input } => pack_list(&input).await?,
            PackCommand::Extract { input, output } => pack_extract(&input, &output).await?,
            PackCommand::Create { input, output } => pack_create(&input, &output).await?,
        },
        Command::Wad => return Err(PakError::NotImplemented("wad").into()),
        Command::Lmp => return Err(PakError::NotImplemented("lmp").into()),
    }

    Ok(())
}

/// Print an archive summary: file size, entry-table size, entry count.
async fn pack_info(input: &Path) -> Result<()> {
    let extractor = open(input)?;
    let summary = extractor.info().await?;

    println!("archive:  {}", input.display());
    println!(
        "size:     {} ({} bytes)",
        format_size(summary.archive_size),
        summary.archive_size
    );
    println!("table:    {} bytes", summary.table_size);
    println!("entries:  {}", summary.entry_count);
    Ok(())
}

/// Print `(index, name, size)` rows for every entry, in on-disk order.
async fn pack_list(input: &Path) -> Result<()> {
    let extractor = open(input)?;
    let entries = extractor.list().await?;

    println!("{:>6}  {:>10}  Name", "Index", "Size");
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "{:>6}  {:>10}  {}",
            index + 1,
            entry.size,
            entry.name_lossy()
        );
    }
    println!("{} entries", entries.len());
    Ok(())
}

/// Extract every entry into a freshly created directory.
async fn pack_extract(input: &Path, output: &Path) -> Result<()> {
    let extractor = open(input)?;
    let report = extractor.extract_to_dir(output).await?;

    println!(
        "extracted {} files ({}) to {}",
        report.files_written,
        format_size(report.bytes_written),
        output.display()
    );
    Ok(())
}

/// Build an archive from a directory tree, then verify it parses back.
async fn pack_create(input: &Path, output: &Path) -> Result<()> {
    let writer = PakWriter::new();
    let report = writer.write_dir(input, output).await?;
    writer.verify(output).await?;

    println!(
        "created {}: {} entries, {} of payload ({} bytes total)",
        output.display(),
        report.entries,
        format_size(report.payload_bytes),
        report.archive_size
    );
    Ok(())
}

fn open(input: &Path) -> Result<PakExtractor<LocalFileReader>> {
    let reader = Arc::new(LocalFileReader::new(input)?);
    Ok(PakExtractor::new(reader))
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
