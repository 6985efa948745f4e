//! Error types for the document store.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Segment backend error.
    #[error("storage error: {0}")]
    Storage(#[from] zoo_storage::StorageError),

    /// Payload encoding or decoding error.
    #[error("codec error: {0}")]
    Codec(#[from] zoo_codec::CodecError),

    /// I/O error outside a segment (directories, index files, lock).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A uniqueness constraint rejected a write.
    #[error("duplicate key in index {index:?}: {key}")]
    DuplicateKey {
        /// Name of the violated index (`_id_` for the primary key).
        index: String,
        /// The conflicting key, as JSON.
        key: String,
    },

    /// A record that cannot be stored.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Why the record was rejected.
        message: String,
    },

    /// A database or cell name that cannot be used on disk.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Segment is corrupted or invalid.
    #[error("segment corruption: {message}")]
    SegmentCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// Checksum mismatch detected.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Expected checksum.
        expected: u32,
        /// Actual checksum.
        actual: u32,
    },

    /// Invalid store layout or index file.
    #[error("invalid store format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Another process holds the store lock.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,

    /// The cell behind this handle was dropped.
    #[error("cell {database}.{cell} was dropped")]
    CellDropped {
        /// Database name.
        database: String,
        /// Cell name.
        cell: String,
    },
}

impl CoreError {
    /// Creates a duplicate key error.
    pub fn duplicate_key(index: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            index: index.into(),
            key: key.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Creates a segment corruption error.
    pub fn segment_corruption(message: impl Into<String>) -> Self {
        Self::SegmentCorruption {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Returns true for uniqueness violations, which callers may recover from.
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}
