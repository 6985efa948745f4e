//! # Zoo Codec
//!
//! Record values, their encodings, and canonical content digests.
//!
//! - [`Value`] - a semi-structured record value (maps, sequences, scalars)
//! - [`from_json_line`] / [`to_json_line`] - the snapshot line format
//! - [`to_cbor`] / [`from_cbor`] - the stored payload format
//! - [`canonicalize`] / [`flatten`] / [`digest_record`] - content hashing
//!   that ignores key order, sequence order, `_id` and stale digests
//!
//! ## Usage
//!
//! ```
//! use zoo_codec::{digest_record, from_json_line};
//!
//! let a = from_json_line(r#"{"a": 1, "b": {"x": 2, "y": 3}}"#).unwrap();
//! let b = from_json_line(r#"{"b": {"y": 3, "x": 2}, "a": 1}"#).unwrap();
//! assert_eq!(digest_record(&a), digest_record(&b));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod canonical;
mod cbor;
mod digest;
mod error;
mod json;
mod value;

pub use canonical::{canonical_eq, canonicalize, flatten, Token};
pub use cbor::{from_cbor, to_cbor};
pub use digest::{
    digest_record, digest_value, stored_digest, strip_reserved, with_digest, Digest, TokenHasher,
    DIGEST_KEY, ID_KEY, LEGACY_DIGEST_KEY, RESERVED_KEYS,
};
pub use error::{CodecError, CodecResult};
pub use json::{from_json_line, to_json_line, to_json_pretty};
pub use value::Value;
