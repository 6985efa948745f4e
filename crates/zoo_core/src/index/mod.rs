//! Secondary indexes over record fields.
//!
//! Every cell has an implicit unique index on `_id` (named `_id_`), kept
//! by the cell itself. Further indexes are declared with
//! [`Cell::create_index`](crate::Cell::create_index) on a dotted field path
//! and are:
//! - Keyed by the canonical digest of the field value, so `{"a":1,"b":2}`
//!   and `{"b":2,"a":1}` are the same key
//! - Sparse: records where the path does not resolve are not indexed
//! - Fully derivable from the segment; only their specs are persisted

mod hash;
mod persistence;

pub use hash::FieldIndex;
pub use persistence::{load_specs, save_specs};

use serde::{Deserialize, Serialize};

/// Name of the implicit primary-key index.
pub const PRIMARY_INDEX: &str = "_id_";

/// Declaration of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name, unique within a cell.
    pub name: String,
    /// Dotted path of the indexed field.
    pub field: String,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexSpec {
    /// Creates a non-unique index spec named after its field.
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            name: field.clone(),
            field,
            unique: false,
        }
    }

    /// Makes this a unique index.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Spec of the implicit `_id` index.
    #[must_use]
    pub fn primary() -> Self {
        Self {
            name: PRIMARY_INDEX.to_string(),
            field: zoo_codec::ID_KEY.to_string(),
            unique: true,
        }
    }
}
