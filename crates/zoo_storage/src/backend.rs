//! The byte store trait shared by all segment backends.

use crate::error::StorageResult;

/// An append-only byte store holding one cell segment.
///
/// The store never interprets what it holds. Offsets returned by
/// [`append`](StorageBackend::append) stay valid until the store is
/// truncated below them, cleared, or has its contents replaced.
pub trait StorageBackend: Send + Sync {
    /// Reads exactly `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`](crate::StorageError::ReadPastEnd)
    /// when the range is not fully inside the store, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends `data` and returns the offset it was written at.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Current size in bytes, which is also the offset of the next append.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Makes data and metadata durable on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Cuts the store down to `new_size` bytes.
    ///
    /// Used on open to discard a record that was only partially written
    /// when a previous process died.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` exceeds the current size or the
    /// truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Replaces the whole contents with `data`.
    ///
    /// Used by compaction. Either the old or the new contents survive a
    /// crash, never a mix.
    ///
    /// # Errors
    ///
    /// Returns an error if the new contents cannot be written; the old
    /// contents are then left in place.
    fn replace_contents(&mut self, data: &[u8]) -> StorageResult<()>;
}
