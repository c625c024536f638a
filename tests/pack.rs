//! End-to-end tests over real files: archives are laid out byte-by-byte,
//! written to a temp directory, and driven through the public engine API.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use rpak::{
    CapacityError, FormatError, LocalFileReader, PakError, PakExtractor, PakLimits, PakWriter,
};

const HEADER_LEN: usize = 12;
const ENTRY_LEN: usize = 64;
const ENTRY_NAME_LEN: usize = 56;

fn entry_record(name: &[u8], offset: i32, size: i32) -> Vec<u8> {
    assert!(name.len() <= ENTRY_NAME_LEN);
    let mut rec = vec![0u8; ENTRY_LEN];
    rec[..name.len()].copy_from_slice(name);
    rec[ENTRY_NAME_LEN..ENTRY_NAME_LEN + 4].copy_from_slice(&offset.to_le_bytes());
    rec[ENTRY_NAME_LEN + 4..].copy_from_slice(&size.to_le_bytes());
    rec
}

/// Build an archive with payloads right after the header and the entry
/// table at the end (the same layout `create` uses).
fn build_pak(entries: &[(&[u8], &[u8])]) -> Vec<u8> {
    let mut payloads = Vec::new();
    let mut table = Vec::new();
    for (name, data) in entries {
        let offset = (HEADER_LEN + payloads.len()) as i32;
        table.extend_from_slice(&entry_record(name, offset, data.len() as i32));
        payloads.extend_from_slice(data);
    }

    let table_offset = (HEADER_LEN + payloads.len()) as i32;
    let mut pak = Vec::new();
    pak.extend_from_slice(b"PACK");
    pak.extend_from_slice(&table_offset.to_le_bytes());
    pak.extend_from_slice(&(table.len() as i32).to_le_bytes());
    pak.extend_from_slice(&payloads);
    pak.extend_from_slice(&table);
    pak
}

fn write_pak(dir: &TempDir, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join("test.pak");
    fs::write(&path, bytes).unwrap();
    path
}

fn open(path: &Path) -> PakExtractor<LocalFileReader> {
    PakExtractor::new(Arc::new(LocalFileReader::new(path).unwrap()))
}

#[tokio::test]
async fn info_reports_size_table_and_count() {
    let dir = TempDir::new().unwrap();
    let bytes = build_pak(&[(b"a.txt", b"hello"), (b"b.bin", &[0u8; 100])]);
    let path = write_pak(&dir, &bytes);

    let summary = open(&path).info().await.unwrap();
    assert_eq!(summary.archive_size, bytes.len() as u64);
    assert_eq!(summary.table_size, 2 * ENTRY_LEN as u64);
    assert_eq!(summary.entry_count, 2);
}

#[tokio::test]
async fn list_yields_entries_in_disk_order() {
    let dir = TempDir::new().unwrap();
    // Table order is deliberately not alphabetical.
    let path = write_pak(
        &dir,
        &build_pak(&[(b"zebra", b"zz"), (b"alpha", b"aaa"), (b"mid", b"m")]),
    );

    let entries = open(&path).list().await.unwrap();
    let names: Vec<String> = entries.iter().map(|e| e.name_lossy().into_owned()).collect();
    assert_eq!(names, ["zebra", "alpha", "mid"]);
    assert_eq!(entries[0].size, 2);
    assert_eq!(entries[1].size, 3);
}

/// Classic layout variant: table at offset 12, payload after it.
/// Payload position relative to the table must not matter.
#[tokio::test]
async fn table_before_payload_layout_is_accepted() {
    let dir = TempDir::new().unwrap();
    let mut pak = Vec::new();
    pak.extend_from_slice(b"PACK");
    pak.extend_from_slice(&12i32.to_le_bytes());
    pak.extend_from_slice(&64i32.to_le_bytes());
    pak.extend_from_slice(&entry_record(b"a.txt", 76, 5));
    pak.extend_from_slice(b"hello");
    assert_eq!(pak.len(), 81);
    let path = write_pak(&dir, &pak);

    let entries = open(&path).list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name_lossy(), "a.txt");
    assert_eq!(entries[0].size, 5);

    let out = dir.path().join("out");
    let report = open(&path).extract_to_dir(&out).await.unwrap();
    assert_eq!(report.files_written, 1);
    assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"hello");
}

#[tokio::test]
async fn bad_magic_is_rejected_before_entries_are_read() {
    let dir = TempDir::new().unwrap();
    let mut bytes = build_pak(&[(b"a.txt", b"hello")]);
    bytes[0..4].copy_from_slice(b"XACK");
    let path = write_pak(&dir, &bytes);

    let err = open(&path).info().await.unwrap_err();
    assert!(matches!(
        err,
        PakError::Format(FormatError::BadMagic { .. })
    ));
    let err = open(&path).list().await.unwrap_err();
    assert!(matches!(
        err,
        PakError::Format(FormatError::BadMagic { .. })
    ));
}

#[tokio::test]
async fn short_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let path = write_pak(&dir, b"PACK");

    let err = open(&path).info().await.unwrap_err();
    match err {
        PakError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("expected io error, got {other:?}"),
    }
}

#[tokio::test]
async fn table_past_end_of_file_is_truncated_entry_table() {
    let dir = TempDir::new().unwrap();
    let mut pak = Vec::new();
    pak.extend_from_slice(b"PACK");
    pak.extend_from_slice(&12i32.to_le_bytes());
    pak.extend_from_slice(&128i32.to_le_bytes()); // two entries, none present
    let path = write_pak(&dir, &pak);

    let err = open(&path).info().await.unwrap_err();
    assert!(matches!(
        err,
        PakError::Format(FormatError::TruncatedEntryTable { .. })
    ));
}

#[tokio::test]
async fn extraction_is_byte_exact() {
    let dir = TempDir::new().unwrap();
    let big: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    let path = write_pak(
        &dir,
        &build_pak(&[
            (b"a.txt", b"hello"),
            (b"maps/e1m1.bsp", &big),
            (b"empty.lmp", b""),
        ]),
    );

    let out = dir.path().join("extracted");
    let report = open(&path).extract_to_dir(&out).await.unwrap();
    assert_eq!(report.files_written, 3);
    assert_eq!(report.bytes_written, 5 + big.len() as u64);

    assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(out.join("maps/e1m1.bsp")).unwrap(), big);
    assert_eq!(fs::read(out.join("empty.lmp")).unwrap(), b"");
}

#[tokio::test]
async fn extract_refuses_existing_output_dir() {
    let dir = TempDir::new().unwrap();
    let path = write_pak(&dir, &build_pak(&[(b"a.txt", b"hello")]));

    let out = dir.path().join("existing");
    fs::create_dir(&out).unwrap();
    fs::write(out.join("sentinel"), b"keep me").unwrap();

    let err = open(&path).extract_to_dir(&out).await.unwrap_err();
    assert!(matches!(
        err,
        PakError::Capacity(CapacityError::OutputDirExists(_))
    ));

    // Directory contents are untouched.
    let names: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, ["sentinel"]);
    assert_eq!(fs::read(out.join("sentinel")).unwrap(), b"keep me");
}

#[tokio::test]
async fn output_dir_under_a_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let path = write_pak(&dir, &build_pak(&[(b"a.txt", b"hello")]));

    // A stat failure that is not "does not exist" (here: a path component
    // is a regular file) must surface as Io, not be mistaken for a fresh
    // output location.
    let file = dir.path().join("not-a-dir");
    fs::write(&file, b"x").unwrap();

    let err = open(&path)
        .extract_to_dir(&file.join("out"))
        .await
        .unwrap_err();
    assert!(matches!(err, PakError::Io(_)));
    assert_eq!(fs::read(&file).unwrap(), b"x");
}

#[tokio::test]
async fn truncated_payload_fails_extraction() {
    let dir = TempDir::new().unwrap();
    // Entry table at 12, payload claimed at 76 with 50 bytes, but the file
    // ends after 5.
    let mut pak = Vec::new();
    pak.extend_from_slice(b"PACK");
    pak.extend_from_slice(&12i32.to_le_bytes());
    pak.extend_from_slice(&64i32.to_le_bytes());
    pak.extend_from_slice(&entry_record(b"a.txt", 76, 50));
    pak.extend_from_slice(b"hello");
    let path = write_pak(&dir, &pak);

    let out = dir.path().join("out");
    let err = open(&path).extract_to_dir(&out).await.unwrap_err();
    match err {
        PakError::Format(FormatError::TruncatedPayload {
            index,
            expected,
            got,
            ..
        }) => {
            assert_eq!(index, 0);
            assert_eq!(expected, 50);
            assert_eq!(got, 5);
        }
        other => panic!("expected truncated payload, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_entry_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_pak(
        &dir,
        &build_pak(&[(b"same.txt", b"one"), (b"same.txt", b"two")]),
    );

    // Listing tolerates the duplicates so damaged archives stay inspectable.
    assert_eq!(open(&path).list().await.unwrap().len(), 2);

    let out = dir.path().join("out");
    let err = open(&path).extract_to_dir(&out).await.unwrap_err();
    assert!(matches!(
        err,
        PakError::Format(FormatError::DuplicateName { .. })
    ));
    // Rejected before anything was written.
    assert!(!out.exists());
}

#[tokio::test]
async fn path_traversal_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_pak(&dir, &build_pak(&[(b"../evil.txt", b"x")]));

    let out = dir.path().join("out");
    let err = open(&path).extract_to_dir(&out).await.unwrap_err();
    assert!(matches!(
        err,
        PakError::Format(FormatError::UnsafeName { .. })
    ));
    assert!(!out.exists());
}

#[tokio::test]
async fn oversized_payload_is_a_capacity_error() {
    let dir = TempDir::new().unwrap();
    let path = write_pak(&dir, &build_pak(&[(b"big.bin", &[7u8; 64])]));

    let limits = PakLimits {
        max_entry_size: 16,
        ..PakLimits::default()
    };
    let extractor =
        PakExtractor::with_limits(Arc::new(LocalFileReader::new(&path).unwrap()), limits);

    let out = dir.path().join("out");
    let err = extractor.extract_to_dir(&out).await.unwrap_err();
    match err {
        PakError::Capacity(CapacityError::PayloadTooLarge { name, size, max }) => {
            assert_eq!(name, "big.bin");
            assert_eq!(size, 64);
            assert_eq!(max, 16);
        }
        other => panic!("expected payload too large, got {other:?}"),
    }
    assert!(!out.exists());
}

#[tokio::test]
async fn create_then_extract_round_trips() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("maps")).unwrap();
    fs::write(src.join("a.txt"), b"hello").unwrap();
    fs::write(src.join("maps/e1m1.bsp"), vec![0xABu8; 4096]).unwrap();

    let pak_path = dir.path().join("built.pak");
    let writer = PakWriter::new();
    let report = writer.write_dir(&src, &pak_path).await.unwrap();
    assert_eq!(report.entries, 2);
    assert_eq!(report.payload_bytes, 5 + 4096);
    assert_eq!(
        report.archive_size,
        fs::metadata(&pak_path).unwrap().len()
    );
    assert_eq!(writer.verify(&pak_path).await.unwrap(), 2);

    // Sorted by entry name, so a.txt comes first.
    let entries = open(&pak_path).list().await.unwrap();
    let names: Vec<String> = entries.iter().map(|e| e.name_lossy().into_owned()).collect();
    assert_eq!(names, ["a.txt", "maps/e1m1.bsp"]);

    let out = dir.path().join("out");
    open(&pak_path).extract_to_dir(&out).await.unwrap();
    assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(out.join("maps/e1m1.bsp")).unwrap(), vec![0xABu8; 4096]);
}

#[tokio::test]
async fn create_refuses_existing_output_file() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), b"x").unwrap();

    let pak_path = dir.path().join("built.pak");
    fs::write(&pak_path, b"already here").unwrap();

    let err = PakWriter::new().write_dir(&src, &pak_path).await.unwrap_err();
    match err {
        PakError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists),
        other => panic!("expected io error, got {other:?}"),
    }
    assert_eq!(fs::read(&pak_path).unwrap(), b"already here");
}

#[tokio::test]
async fn create_rejects_names_over_the_field_width() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    let long = "x".repeat(ENTRY_NAME_LEN + 1);
    fs::write(src.join(&long), b"data").unwrap();

    let err = PakWriter::new()
        .write_dir(&src, &dir.path().join("built.pak"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PakError::Capacity(CapacityError::NameTooLong { .. })
    ));
}

#[tokio::test]
async fn create_of_empty_directory_fails() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();

    let err = PakWriter::new()
        .write_dir(&src, &dir.path().join("built.pak"))
        .await
        .unwrap_err();
    assert!(matches!(err, PakError::Io(_)));
}

#[tokio::test]
async fn missing_archive_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.pak");
    assert!(LocalFileReader::new(&missing).is_err());
}

#[tokio::test]
async fn directory_as_archive_is_rejected_on_open() {
    let dir = TempDir::new().unwrap();
    let err = LocalFileReader::new(dir.path()).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}
