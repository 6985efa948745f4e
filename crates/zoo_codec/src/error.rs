//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding, decoding or parsing digests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A snapshot line is not valid JSON.
    #[error("invalid JSON: {message}")]
    InvalidJson {
        /// Parser message, including the column.
        message: String,
    },

    /// A line parsed, but not to a JSON object.
    #[error("expected a JSON object, found {found}")]
    NotADocument {
        /// Kind of value that was found instead.
        found: &'static str,
    },

    /// Failed to encode a value.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode stored bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// Text that is not a 64-digit hex digest.
    #[error("invalid digest: {input:?}")]
    InvalidDigest {
        /// The rejected input.
        input: String,
    },
}

impl CodecError {
    /// Create an invalid JSON error.
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson {
            message: message.into(),
        }
    }

    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Create an invalid digest error.
    pub fn invalid_digest(input: impl Into<String>) -> Self {
        Self::InvalidDigest {
            input: input.into(),
        }
    }
}
