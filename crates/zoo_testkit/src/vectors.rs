//! Digest test vectors.
//!
//! Fixed records with their expected content digests. A change to the
//! canonical form or the token framing shows up here first.

use serde::{Deserialize, Serialize};

/// A record with its expected digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// The record, as one line of JSON.
    pub record_json: String,
    /// Expected digest, lowercase hex.
    pub expected_hex: String,
}

fn vector(id: &str, description: &str, record_json: &str, expected_hex: &str) -> DigestVector {
    DigestVector {
        id: id.into(),
        description: description.into(),
        record_json: record_json.into(),
        expected_hex: expected_hex.into(),
    }
}

/// Content digest vectors.
pub fn digest_vectors() -> Vec<DigestVector> {
    vec![
        vector(
            "empty",
            "Empty record hashes as an empty token stream",
            "{}",
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        ),
        vector(
            "only_id",
            "The identifier is not content",
            r#"{"_id": "KX369547"}"#,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        ),
        vector(
            "single_integer",
            "One integer field",
            r#"{"a": 1}"#,
            "38e5117b4dc34f4501cb78474c9adfef08513ef94aafa1e1a9a068144e2c665b",
        ),
        vector(
            "sorted_sequence",
            "Sequence elements and keys are sorted, _id is dropped",
            r#"{"_id": "x", "b": [2, 1], "a": null}"#,
            "73823de1605421ef10cf2736bc452a766a6fe9610aa777445060a474df4e839b",
        ),
        vector(
            "nested_map",
            "Nested maps are sorted by key at every level",
            r#"{"seq": "ACGT", "meta": {"year": 2016, "host": "Avian"}}"#,
            "e57ea8930fb501614e4fa9a408afc6217879b490cfc57c3c1b2fdf7da82862a4",
        ),
        vector(
            "float_and_bool",
            "Floats and booleans carry their own tags; stale digests are dropped",
            r#"{"x": 1.5, "t": true, "md5": "0cc175b9c0f1b6a831c399e269772661"}"#,
            "da040a335d0e4780fac9aa075d4d2cc90f4fad56d65da887851dd1e54174ed96",
        ),
    ]
}

/// Exports all vectors as JSON.
pub fn all_vectors_json() -> String {
    serde_json::to_string_pretty(&digest_vectors()).expect("Failed to serialize vectors")
}
