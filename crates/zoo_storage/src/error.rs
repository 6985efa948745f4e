//! Storage errors.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by segment backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read reached past the end of the segment.
    #[error("read beyond end of segment: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current segment size.
        size: u64,
    },

    /// Truncation was asked to grow the segment.
    #[error("cannot truncate segment of {size} bytes to {requested} bytes")]
    TruncateBeyondEnd {
        /// The requested size.
        requested: u64,
        /// The current segment size.
        size: u64,
    },
}
