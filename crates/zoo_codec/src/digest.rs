//! Canonical content digests.
//!
//! A record's digest covers every field except its identifier and any
//! digest left over from an earlier snapshot:
//!
//! 1. strip `_id`, `digest` and `md5` (on a copy, never in place)
//! 2. [`canonicalize`] the rest
//! 3. [`flatten`] it into a token stream
//! 4. feed each token to SHA-256 as `<tag><len>:<text>`
//!
//! The framing keeps token boundaries and token types apart, so
//! `["ab", "c"]` and `["a", "bc"]`, or `1` and `"1"`, never collide.

use crate::canonical::{canonicalize, flatten, Token};
use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

/// Reserved key holding a record's primary identifier.
pub const ID_KEY: &str = "_id";

/// Reserved key under which snapshots store the content digest.
pub const DIGEST_KEY: &str = "digest";

/// Digest key written by older snapshots; read and stripped, never written.
pub const LEGACY_DIGEST_KEY: &str = "md5";

/// Keys excluded from the content digest.
pub const RESERVED_KEYS: [&str; 3] = [ID_KEY, DIGEST_KEY, LEGACY_DIGEST_KEY];

/// A 32-byte SHA-256 content digest, displayed as 64 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Length of the hex form.
    pub const HEX_LEN: usize = 64;

    /// Wraps raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parses the hex form (either case).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidDigest`] unless `hex` is exactly 64 hex
    /// digits.
    pub fn from_hex(hex: &str) -> CodecResult<Self> {
        if hex.len() != Self::HEX_LEN || !hex.is_ascii() {
            return Err(CodecError::invalid_digest(hex));
        }
        let mut bytes = [0u8; 32];
        for (byte, pair) in bytes.iter_mut().zip(hex.as_bytes().chunks_exact(2)) {
            let pair = std::str::from_utf8(pair).map_err(|_| CodecError::invalid_digest(hex))?;
            *byte = u8::from_str_radix(pair, 16).map_err(|_| CodecError::invalid_digest(hex))?;
        }
        Ok(Self(bytes))
    }

    /// Returns the hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl FromStr for Digest {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Incremental SHA-256 over a token stream.
#[derive(Default)]
pub struct TokenHasher {
    hasher: Sha256,
}

impl TokenHasher {
    /// Creates a hasher with nothing fed yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one framed token.
    pub fn update(&mut self, token: &Token<'_>) {
        let text = token.render();
        self.hasher.update([token.tag()]);
        self.hasher.update(text.len().to_string().as_bytes());
        self.hasher.update(b":");
        self.hasher.update(text.as_bytes());
    }

    /// Consumes the hasher and returns the digest.
    #[must_use]
    pub fn finish(self) -> Digest {
        Digest(self.hasher.finalize().into())
    }
}

/// Digest of an arbitrary value, reserved keys included.
///
/// Used where the whole value is the content, e.g. unique index keys.
#[must_use]
pub fn digest_value(value: &Value) -> Digest {
    let canonical = canonicalize(value);
    let mut hasher = TokenHasher::new();
    for token in flatten(&canonical) {
        hasher.update(&token);
    }
    hasher.finish()
}

/// Returns a copy of `record` without `_id` and digest fields.
#[must_use]
pub fn strip_reserved(record: &Value) -> Value {
    record.without_keys(&RESERVED_KEYS)
}

/// Content digest of a record, ignoring `_id` and stale digests.
///
/// ```
/// use zoo_codec::{digest_record, Value};
///
/// let a = Value::map([("a", Value::from(1)), ("_id", Value::from("x"))]);
/// let b = Value::map([("_id", Value::from("y")), ("a", Value::from(1))]);
/// assert_eq!(digest_record(&a), digest_record(&b));
/// ```
#[must_use]
pub fn digest_record(record: &Value) -> Digest {
    digest_value(&strip_reserved(record))
}

/// Returns the digest stored on a record, under `digest` or `md5`.
///
/// `None` when neither key holds text. Text that is not a digest of this
/// format (e.g. a legacy MD5) is returned as-is for the caller to compare.
#[must_use]
pub fn stored_digest(record: &Value) -> Option<&str> {
    record
        .get(DIGEST_KEY)
        .or_else(|| record.get(LEGACY_DIGEST_KEY))
        .and_then(Value::as_text)
}

/// Returns a copy of `record` with a fresh digest attached and `_id` last.
///
/// Any stale `md5` field is dropped.
#[must_use]
pub fn with_digest(record: &Value) -> Value {
    let digest = digest_record(record);
    let mut stamped = strip_reserved(record);
    stamped.insert(DIGEST_KEY, Value::Text(digest.to_hex()));
    if let Some(id) = record.get(ID_KEY) {
        stamped.insert(ID_KEY, id.clone());
    }
    stamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::from_json_line;

    fn parse(line: &str) -> Value {
        from_json_line(line).unwrap()
    }

    #[test]
    fn reordered_nested_maps_hash_identically() {
        let a = parse(r#"{"a": 1, "b": {"x": 2, "y": 3}}"#);
        let b = parse(r#"{"b": {"y": 3, "x": 2}, "a": 1}"#);
        assert_eq!(digest_record(&a), digest_record(&b));
    }

    #[test]
    fn reordered_sequences_hash_identically() {
        let a = parse(r#"{"tags": ["b", "a", {"k": [3, 1, 2]}]}"#);
        let b = parse(r#"{"tags": [{"k": [2, 3, 1]}, "a", "b"]}"#);
        assert_eq!(digest_record(&a), digest_record(&b));
    }

    #[test]
    fn id_and_stale_digest_are_ignored() {
        let plain = parse(r#"{"a": 1}"#);
        let tagged = parse(r#"{"_id": "u1", "a": 1, "digest": "stale", "md5": "older"}"#);
        assert_eq!(digest_record(&plain), digest_record(&tagged));
    }

    #[test]
    fn content_changes_change_digest() {
        let base = digest_record(&parse(r#"{"a": 1, "b": [1, 2]}"#));
        for changed in [
            r#"{"a": 2, "b": [1, 2]}"#,
            r#"{"a": 1, "b": [1, 2, 2]}"#,
            r#"{"a": "1", "b": [1, 2]}"#,
            r#"{"a": 1.0, "b": [1, 2]}"#,
            r#"{"A": 1, "b": [1, 2]}"#,
            r#"{"a": 1, "b": [1, 2], "c": null}"#,
        ] {
            assert_ne!(base, digest_record(&parse(changed)), "{changed}");
        }
    }

    #[test]
    fn nesting_is_not_content() {
        let nested = parse(r#"{"a": 1, "b": [[1, 2]]}"#);
        let flat = parse(r#"{"a": 1, "b": [1, 2]}"#);
        assert_eq!(digest_record(&nested), digest_record(&flat));
        assert_eq!(digest_record(&parse(r#"{"e": {}}"#)), digest_record(&parse(r#"{"e": []}"#)));
    }

    #[test]
    fn token_boundaries_are_framed() {
        let a = parse(r#"{"s": ["ab", "c"]}"#);
        let b = parse(r#"{"s": ["a", "bc"]}"#);
        assert_ne!(digest_record(&a), digest_record(&b));
    }

    #[test]
    fn nan_does_not_collide_with_text() {
        let float = Value::map([("v", Value::Float(f64::NAN))]);
        let text = Value::map([("v", Value::from("NaN"))]);
        assert_ne!(digest_record(&float), digest_record(&text));
    }

    #[test]
    fn digest_is_deterministic_and_hex() {
        let record = parse(r#"{"sequence": "ACGT", "meta": {"host": "Avian"}}"#);
        let first = digest_record(&record);
        assert_eq!(first, digest_record(&record));

        let hex = first.to_hex();
        assert_eq!(hex.len(), Digest::HEX_LEN);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(Digest::from_hex(&hex).unwrap(), first);
        assert_eq!(hex.to_uppercase().parse::<Digest>().unwrap(), first);
    }

    #[test]
    fn empty_record_has_digest_of_empty_stream() {
        let empty = TokenHasher::new().finish();
        assert_eq!(digest_record(&parse("{}")), empty);
        assert_eq!(digest_record(&parse(r#"{"_id": "only"}"#)), empty);
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(Digest::from_hex("abc").is_err());
        assert!(Digest::from_hex(&"zz".repeat(32)).is_err());
        assert!(Digest::from_hex(&"é".repeat(32)).is_err());
    }

    #[test]
    fn with_digest_reattaches_id_last() {
        let record = parse(r#"{"_id": "u1", "md5": "old", "b": 2, "a": 1}"#);
        let stamped = with_digest(&record);
        let keys: Vec<&str> = stamped.as_map().unwrap().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a", DIGEST_KEY, ID_KEY]);
        assert_eq!(
            stored_digest(&stamped),
            Some(digest_record(&record).to_hex().as_str())
        );
        assert_eq!(record.get(LEGACY_DIGEST_KEY), Some(&Value::from("old")));
    }

    #[test]
    fn stored_digest_falls_back_to_md5() {
        assert_eq!(stored_digest(&parse(r#"{"md5": "abc"}"#)), Some("abc"));
        assert_eq!(stored_digest(&parse(r#"{"digest": "d", "md5": "m"}"#)), Some("d"));
        assert_eq!(stored_digest(&parse(r#"{"digest": 5}"#)), None);
    }
}
