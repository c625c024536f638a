//! On-disk PACK structures and their binary codec.
//!
//! All multi-byte fields are little-endian on disk regardless of the host,
//! and `from_bytes`/`to_bytes` round-trip byte-for-byte.

use std::borrow::Cow;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::error::{FormatError, PakResult};

/// Magic code at offset 0 of every PACK archive.
pub const MAGIC: [u8; 4] = *b"PACK";

/// Header record length: magic + table offset + table size.
pub const HEADER_LEN: usize = 12;

/// Fixed width of the NUL-padded entry name field.
pub const ENTRY_NAME_LEN: usize = 56;

/// Entry record length: name + payload offset + payload size.
pub const ENTRY_LEN: usize = ENTRY_NAME_LEN + 4 + 4;

/// Archive header: where the entry table lives and how long it is.
///
/// The magic code is not stored; it is validated on decode and emitted on
/// encode. `table_size` is a byte length, not an entry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PakHeader {
    pub table_offset: i32,
    pub table_size: i32,
}

impl PakHeader {
    /// Decode and validate a header from the first [`HEADER_LEN`] bytes of
    /// an archive.
    ///
    /// # Errors
    ///
    /// - [`FormatError::BadMagic`] if the magic code is wrong (checked
    ///   before anything else is read)
    /// - [`FormatError::BadOffset`] if the table offset is not positive
    /// - [`FormatError::BadSize`] if the table size is not positive or is
    ///   not a whole number of [`ENTRY_LEN`]-byte records
    pub fn from_bytes(data: &[u8; HEADER_LEN]) -> PakResult<Self> {
        if data[0..4] != MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(&data[0..4]);
            return Err(FormatError::BadMagic { found }.into());
        }

        let mut cursor = Cursor::new(&data[4..]);
        // Cursor over a fixed 8-byte slice; the reads cannot fail
        let table_offset = cursor.read_i32::<LittleEndian>().unwrap_or_default();
        let table_size = cursor.read_i32::<LittleEndian>().unwrap_or_default();

        if table_offset <= 0 {
            return Err(FormatError::BadOffset(table_offset).into());
        }
        if table_size <= 0 || table_size as usize % ENTRY_LEN != 0 {
            return Err(FormatError::BadSize(table_size).into());
        }

        Ok(Self {
            table_offset,
            table_size,
        })
    }

    /// Encode the header; the exact inverse of [`PakHeader::from_bytes`].
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&MAGIC);
        let mut cursor = Cursor::new(&mut out[4..]);
        let _ = cursor.write_i32::<LittleEndian>(self.table_offset);
        let _ = cursor.write_i32::<LittleEndian>(self.table_size);
        out
    }

    /// Number of entry records the table declares.
    pub fn entry_count(&self) -> usize {
        self.table_size as usize / ENTRY_LEN
    }

    /// First byte past the end of the entry table.
    pub fn table_end(&self) -> u64 {
        self.table_offset as u64 + self.table_size as u64
    }
}

/// One named payload record inside an archive.
///
/// `name` is the raw fixed-width field: a NUL-padded byte string with no
/// encoding guarantee. Use [`PakEntry::name_bytes`] for the trimmed bytes
/// or [`PakEntry::name_lossy`] for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PakEntry {
    pub name: [u8; ENTRY_NAME_LEN],
    pub offset: i32,
    pub size: i32,
}

impl PakEntry {
    /// Decode an entry record. The name field is copied verbatim; offset
    /// and size use the same byte order as the header. Structural checks
    /// (offset/size sanity) are the parser's job, so this cannot fail.
    pub fn from_bytes(data: &[u8; ENTRY_LEN]) -> Self {
        let mut name = [0u8; ENTRY_NAME_LEN];
        name.copy_from_slice(&data[..ENTRY_NAME_LEN]);

        let mut cursor = Cursor::new(&data[ENTRY_NAME_LEN..]);
        let offset = cursor.read_i32::<LittleEndian>().unwrap_or_default();
        let size = cursor.read_i32::<LittleEndian>().unwrap_or_default();

        Self { name, offset, size }
    }

    /// Encode the entry record; the exact inverse of [`PakEntry::from_bytes`].
    pub fn to_bytes(&self) -> [u8; ENTRY_LEN] {
        let mut out = [0u8; ENTRY_LEN];
        out[..ENTRY_NAME_LEN].copy_from_slice(&self.name);
        let mut cursor = Cursor::new(&mut out[ENTRY_NAME_LEN..]);
        let _ = cursor.write_i32::<LittleEndian>(self.offset);
        let _ = cursor.write_i32::<LittleEndian>(self.size);
        out
    }

    /// The name with trailing NUL padding removed.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(ENTRY_NAME_LEN);
        &self.name[..end]
    }

    /// The name as a string, replacing any invalid UTF-8.
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pak::error::PakError;

    fn header_bytes(magic: &[u8; 4], offset: i32, size: i32) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(magic);
        buf[4..8].copy_from_slice(&offset.to_le_bytes());
        buf[8..12].copy_from_slice(&size.to_le_bytes());
        buf
    }

    #[test]
    fn header_round_trips_byte_for_byte() {
        let bytes = header_bytes(b"PACK", 12, 128);
        let header = PakHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.table_offset, 12);
        assert_eq!(header.table_size, 128);
        assert_eq!(header.entry_count(), 2);
        assert_eq!(header.to_bytes(), bytes);
    }

    #[test]
    fn header_rejects_bad_magic_first() {
        // Offset and size are also invalid, but the magic check must win.
        let bytes = header_bytes(b"XACK", -1, -1);
        let err = PakHeader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            PakError::Format(FormatError::BadMagic { found: [b'X', b'A', b'C', b'K'] })
        ));
    }

    #[test]
    fn header_rejects_non_positive_offset() {
        let err = PakHeader::from_bytes(&header_bytes(b"PACK", 0, 64)).unwrap_err();
        assert!(matches!(err, PakError::Format(FormatError::BadOffset(0))));
    }

    #[test]
    fn header_rejects_bad_table_size() {
        let err = PakHeader::from_bytes(&header_bytes(b"PACK", 12, -64)).unwrap_err();
        assert!(matches!(err, PakError::Format(FormatError::BadSize(-64))));

        // Not a whole number of 64-byte records
        let err = PakHeader::from_bytes(&header_bytes(b"PACK", 12, 65)).unwrap_err();
        assert!(matches!(err, PakError::Format(FormatError::BadSize(65))));
    }

    #[test]
    fn entry_round_trips_and_preserves_name_padding() {
        let mut name = [0u8; ENTRY_NAME_LEN];
        name[..9].copy_from_slice(b"maps/e1m1");
        let entry = PakEntry {
            name,
            offset: 76,
            size: 1337,
        };

        let bytes = entry.to_bytes();
        let decoded = PakEntry::from_bytes(&bytes);
        assert_eq!(decoded, entry);
        assert_eq!(decoded.to_bytes(), bytes);
        assert_eq!(decoded.name_bytes(), b"maps/e1m1");
        assert_eq!(decoded.name_lossy(), "maps/e1m1");
    }

    #[test]
    fn entry_name_without_padding_uses_full_width() {
        let name = [b'x'; ENTRY_NAME_LEN];
        let entry = PakEntry {
            name,
            offset: 12,
            size: 1,
        };
        assert_eq!(entry.name_bytes().len(), ENTRY_NAME_LEN);
    }

    #[test]
    fn entry_name_is_not_assumed_utf8() {
        let mut name = [0u8; ENTRY_NAME_LEN];
        name[..3].copy_from_slice(&[0xFF, 0xFE, 0x41]);
        let entry = PakEntry {
            name,
            offset: 12,
            size: 0,
        };
        assert_eq!(entry.name_bytes(), &[0xFF, 0xFE, 0x41]);
        assert_eq!(entry.name_lossy(), "\u{FFFD}\u{FFFD}A");
    }
}
