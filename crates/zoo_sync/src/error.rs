//! Error types for cell synchronization.

use std::io;
use thiserror::Error;
use zoo_codec::CodecError;
use zoo_core::CoreError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Document store error.
    #[error("store error: {0}")]
    Store(#[from] CoreError),

    /// Record encoding error outside of snapshot parsing.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Snapshot or signature file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A snapshot line is not a JSON object.
    #[error("line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Why the line was rejected.
        source: CodecError,
    },

    /// A snapshot record lacks a field the operation needs.
    #[error("line {line}: record has no {field:?} field")]
    MissingField {
        /// 1-based line number.
        line: usize,
        /// The missing field.
        field: String,
    },

    /// Signature serialization error.
    #[error("signature error: {0}")]
    Signature(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Creates a missing field error.
    pub fn missing_field(line: usize, field: impl Into<String>) -> Self {
        Self::MissingField {
            line,
            field: field.into(),
        }
    }

    /// The snapshot line this error points at, if any.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } | Self::MissingField { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_errors_carry_their_line() {
        let err = SyncError::missing_field(7, "_id");
        assert_eq!(err.line(), Some(7));
        assert_eq!(err.to_string(), "line 7: record has no \"_id\" field");

        let parse = SyncError::Parse {
            line: 3,
            source: CodecError::NotADocument { found: "array" },
        };
        assert_eq!(parse.line(), Some(3));
        assert!(parse.to_string().starts_with("line 3: "));
        assert_eq!(SyncError::InvalidConfig("x".into()).line(), None);
    }
}
