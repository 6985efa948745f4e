//! Record filters and projections.

use crate::id::RecordId;
use zoo_codec::{canonical_eq, CodecError, Value, ID_KEY};

/// A conjunction of `path == value` clauses.
///
/// Paths are dotted (`genbank.a`, `tags.0`). Values compare by canonical
/// equality, so key order and sequence order inside them do not matter.
/// The empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter with one `path == value` clause.
    #[must_use]
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(path, value)
    }

    /// A filter matching the record with this identifier.
    #[must_use]
    pub fn id(id: &RecordId) -> Self {
        Self::eq(ID_KEY, id.as_str())
    }

    /// Adds a clause.
    #[must_use]
    pub fn and(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((path.into(), value.into()));
        self
    }

    /// Builds a filter from a map of `path: value` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotADocument`] unless `value` is a map.
    pub fn from_value(value: &Value) -> Result<Self, CodecError> {
        let entries = value.as_map().ok_or(CodecError::NotADocument {
            found: value.kind(),
        })?;
        Ok(Self {
            clauses: entries.to_vec(),
        })
    }

    /// Returns the clauses in the order they were added.
    #[must_use]
    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    /// Whether the filter has no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The identifier this filter pins, if it has an `_id` clause with text.
    #[must_use]
    pub fn pinned_id(&self) -> Option<RecordId> {
        self.clauses
            .iter()
            .find(|(path, _)| path == ID_KEY)
            .and_then(|(_, value)| value.as_text())
            .map(RecordId::from)
    }

    /// Whether `record` satisfies every clause.
    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        self.clauses.iter().all(|(path, expected)| {
            record
                .get_path(path)
                .is_some_and(|actual| canonical_eq(actual, expected))
        })
    }
}

/// Top-level fields to leave out of returned records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    excluded: Vec<String>,
}

impl Projection {
    /// A projection returning whole records.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A projection leaving out `fields`.
    #[must_use]
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Applies the projection to a record.
    #[must_use]
    pub fn apply(&self, record: Value) -> Value {
        if self.excluded.is_empty() {
            return record;
        }
        let keys: Vec<&str> = self.excluded.iter().map(String::as_str).collect();
        record.without_keys(&keys)
    }
}
