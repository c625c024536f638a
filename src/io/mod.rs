mod local;

pub use local::LocalFileReader;

use async_trait::async_trait;

/// Trait for random access reading from an archive source.
///
/// This is the only filesystem primitive the archive engine needs for its
/// read paths. Each handle owns its source exclusively, so separate
/// archives can be processed concurrently without shared cursors.
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer, returning the
    /// number of bytes read (0 at end of source).
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Get the total size of the data source.
    fn size(&self) -> u64;

    /// Read at `offset` until `buf` is full or the source ends, returning
    /// the number of bytes actually read. Callers compare the count against
    /// the buffer length to detect truncated data.
    async fn read_full_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}
