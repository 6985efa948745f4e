//! Record identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use zoo_codec::Value;

/// Primary identifier of a record, stored under the reserved `_id` key.
///
/// Identifiers are opaque text. Fresh ones are random v4 UUIDs; records
/// imported from a snapshot keep whatever identifier they carry. An
/// identifier is assigned once and never recomputed.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing identifier.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads the identifier of a record.
    ///
    /// Returns `None` when `_id` is absent or not text.
    #[must_use]
    pub fn of(record: &Value) -> Option<Self> {
        record
            .get(zoo_codec::ID_KEY)
            .and_then(Value::as_text)
            .map(Self::from_string)
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::from_string(id)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        Value::Text(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique_uuids() {
        let a = RecordId::new();
        let b = RecordId::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn of_reads_text_ids_only() {
        let record = Value::map([("_id", Value::from("KX369547"))]);
        assert_eq!(RecordId::of(&record), Some(RecordId::from("KX369547")));

        let numeric = Value::map([("_id", Value::from(7))]);
        assert_eq!(RecordId::of(&numeric), None);
        assert_eq!(RecordId::of(&Value::empty_map()), None);
    }

    #[test]
    fn display_and_debug() {
        let id = RecordId::from("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(format!("{id:?}"), "RecordId(abc)");
        assert_eq!(Value::from(id), Value::from("abc"));
    }
}
