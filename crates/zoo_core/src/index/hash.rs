//! Hash index on one field.

use crate::error::{CoreError, CoreResult};
use crate::id::RecordId;
use crate::index::IndexSpec;
use std::collections::HashMap;
use zoo_codec::{canonicalize, Value};

/// Equality index from a field's canonical JSON to record ids.
///
/// # Example
///
/// ```rust,ignore
/// let mut index = FieldIndex::new(IndexSpec::new("genbank.a").unique());
/// index.insert(&record, &id)?;
/// let ids = index.lookup(&Value::from("KX369547"));
/// ```
#[derive(Debug)]
pub struct FieldIndex {
    spec: IndexSpec,
    entries: HashMap<String, Vec<RecordId>>,
}

impl FieldIndex {
    /// Creates an empty index.
    pub fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            entries: HashMap::new(),
        }
    }

    /// Returns the index spec.
    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Returns the key `record` is indexed under, if the field resolves.
    pub fn key_of(&self, record: &Value) -> Option<String> {
        record.get_path(&self.spec.field).map(index_key)
    }

    /// Fails if inserting `record` as `id` would violate uniqueness.
    pub fn check(&self, record: &Value, id: &RecordId) -> CoreResult<()> {
        if !self.spec.unique {
            return Ok(());
        }
        let Some(key) = self.key_of(record) else {
            return Ok(());
        };
        match self.entries.get(&key) {
            Some(ids) if ids.iter().any(|existing| existing != id) => {
                let value = record.get_path(&self.spec.field).unwrap_or(&Value::Null);
                Err(CoreError::duplicate_key(
                    &self.spec.name,
                    serde_json::to_string(value).unwrap_or_else(|_| value.kind().to_string()),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Indexes `record` under `id`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the index is unique and another record
    /// already holds the key; the index is left unchanged.
    pub fn insert(&mut self, record: &Value, id: &RecordId) -> CoreResult<()> {
        self.check(record, id)?;
        if let Some(key) = self.key_of(record) {
            let ids = self.entries.entry(key).or_default();
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        Ok(())
    }

    /// Removes `record` as `id`. Returns whether an entry was removed.
    pub fn remove(&mut self, record: &Value, id: &RecordId) -> bool {
        let Some(key) = self.key_of(record) else {
            return false;
        };
        let Some(ids) = self.entries.get_mut(&key) else {
            return false;
        };
        let Some(position) = ids.iter().position(|existing| existing == id) else {
            return false;
        };
        ids.swap_remove(position);
        if ids.is_empty() {
            self.entries.remove(&key);
        }
        true
    }

    /// Ids of records whose field equals `value` canonically.
    pub fn lookup(&self, value: &Value) -> &[RecordId] {
        self.entries
            .get(&index_key(value))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Compact JSON of the canonical form; `{}` and `[]` stay distinct.
fn index_key(value: &Value) -> String {
    let canonical = canonicalize(value);
    serde_json::to_string(&canonical).unwrap_or_else(|_| format!("{canonical:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoo_codec::from_json_line;

    fn rec(json: &str) -> Value {
        from_json_line(json).unwrap()
    }

    #[test]
    fn insert_and_lookup() {
        let mut index = FieldIndex::new(IndexSpec::new("genbank.a"));
        let id = RecordId::from("r1");
        index
            .insert(&rec(r#"{"genbank": {"a": "KX369547"}}"#), &id)
            .unwrap();

        assert_eq!(index.lookup(&Value::from("KX369547")), [id]);
        assert!(index.lookup(&Value::from("other")).is_empty());
    }

    #[test]
    fn keys_compare_canonically() {
        let mut index = FieldIndex::new(IndexSpec::new("meta"));
        let id = RecordId::from("r1");
        index
            .insert(&rec(r#"{"meta": {"x": 1, "tags": ["b", "a"]}}"#), &id)
            .unwrap();

        let probe = rec(r#"{"tags": ["a", "b"], "x": 1}"#);
        assert_eq!(index.lookup(&probe), [id]);
    }

    #[test]
    fn unique_index_rejects_second_holder() {
        let mut index = FieldIndex::new(IndexSpec::new("acc").unique());
        let record = rec(r#"{"acc": "A1"}"#);
        index.insert(&record, &RecordId::from("r1")).unwrap();

        index.insert(&record, &RecordId::from("r1")).unwrap();
        let err = index.insert(&record, &RecordId::from("r2")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::DuplicateKey { ref index, ref key } if index == "acc" && key == "\"A1\""
        ));
        assert_eq!(index.lookup(&Value::from("A1")), [RecordId::from("r1")]);
    }

    #[test]
    fn non_unique_index_collects_ids() {
        let mut index = FieldIndex::new(IndexSpec::new("host"));
        let record = rec(r#"{"host": "Avian"}"#);
        index.insert(&record, &RecordId::from("r1")).unwrap();
        index.insert(&record, &RecordId::from("r2")).unwrap();
        assert_eq!(index.lookup(&Value::from("Avian")).len(), 2);

        assert!(index.remove(&record, &RecordId::from("r1")));
        assert!(!index.remove(&record, &RecordId::from("r1")));
        assert_eq!(index.lookup(&Value::from("Avian")), [RecordId::from("r2")]);
    }

    #[test]
    fn empty_map_and_empty_array_are_distinct_keys() {
        let mut index = FieldIndex::new(IndexSpec::new("meta").unique());
        index.insert(&rec(r#"{"meta": {}}"#), &RecordId::from("r1")).unwrap();
        index.insert(&rec(r#"{"meta": []}"#), &RecordId::from("r2")).unwrap();
        index.insert(&rec(r#"{"meta": [[1, 2]]}"#), &RecordId::from("r3")).unwrap();
        index.insert(&rec(r#"{"meta": [1, 2]}"#), &RecordId::from("r4")).unwrap();

        assert_eq!(index.lookup(&Value::empty_map()), [RecordId::from("r1")]);
        assert_eq!(index.lookup(&Value::Array(vec![])), [RecordId::from("r2")]);
    }

    #[test]
    fn index_is_sparse() {
        let mut index = FieldIndex::new(IndexSpec::new("acc").unique());
        index.insert(&rec(r#"{"other": 1}"#), &RecordId::from("r1")).unwrap();
        index.insert(&rec(r#"{"other": 2}"#), &RecordId::from("r2")).unwrap();
        assert!(index.key_of(&rec(r#"{"other": 1}"#)).is_none());
        assert!(index.lookup(&Value::Null).is_empty());
    }
}
