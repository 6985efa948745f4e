//! Structural deltas between a live record and its snapshot.
//!
//! The delta describes how to get from the live record to the snapshot
//! record. Map keys are compared by name; sequences are compared as
//! multisets, so reordering a sequence is not a change. The reserved keys
//! `_id`, `digest` and `md5` are ignored on both sides.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use zoo_codec::{canonical_eq, canonicalize, strip_reserved, Value};

/// Maximum recursion depth; deeper differences are reported as one change.
const MAX_DIFF_DEPTH: usize = 128;

/// A value replaced at a path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    /// Value in the live record.
    pub old: Value,
    /// Value in the snapshot record.
    pub new: Value,
}

/// Differences of one record, keyed by dotted path.
///
/// A `.` or `\` inside a key is escaped with a backslash, so the top-level
/// key `"a.b"` is reported as `a\.b` and never collides with the nested
/// path `a.b`.
///
/// Serializes to one JSON object; empty categories are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Delta {
    /// Identifier of the compared record.
    #[serde(rename = "_id")]
    pub id: String,
    /// Keys present only in the snapshot record.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub added: BTreeMap<String, Value>,
    /// Keys present only in the live record.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub removed: BTreeMap<String, Value>,
    /// Keys whose value differs.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub changed: BTreeMap<String, Change>,
    /// Sequence elements present only in the snapshot record.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub items_added: BTreeMap<String, Vec<Value>>,
    /// Sequence elements present only in the live record.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub items_removed: BTreeMap<String, Vec<Value>>,
    /// Set when the record is absent from the store.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub missing: bool,
}

impl Delta {
    /// Computes the delta from `live` to `snapshot`.
    #[must_use]
    pub fn compute(id: impl Into<String>, live: &Value, snapshot: &Value) -> Self {
        let mut delta = Self {
            id: id.into(),
            ..Self::default()
        };
        diff_values(
            &strip_reserved(live),
            &strip_reserved(snapshot),
            String::new(),
            &mut delta,
            0,
        );
        delta
    }

    /// Delta of a snapshot record with no live counterpart: every field is
    /// added.
    #[must_use]
    pub fn missing(id: impl Into<String>, snapshot: &Value) -> Self {
        let mut delta = Self::compute(id, &Value::empty_map(), snapshot);
        delta.missing = true;
        delta
    }

    /// Whether the records are equivalent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.missing
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && self.items_added.is_empty()
            && self.items_removed.is_empty()
    }
}

fn child_path(path: &str, key: &str) -> String {
    let mut child = String::with_capacity(path.len() + key.len() + 1);
    if !path.is_empty() {
        child.push_str(path);
        child.push('.');
    }
    for c in key.chars() {
        if c == '.' || c == '\\' {
            child.push('\\');
        }
        child.push(c);
    }
    child
}

fn diff_values(live: &Value, snapshot: &Value, path: String, delta: &mut Delta, depth: usize) {
    if depth > MAX_DIFF_DEPTH {
        if !canonical_eq(live, snapshot) {
            delta.changed.insert(
                path,
                Change {
                    old: live.clone(),
                    new: snapshot.clone(),
                },
            );
        }
        return;
    }

    match (live, snapshot) {
        (Value::Map(live_entries), Value::Map(snapshot_entries)) => {
            for (key, live_value) in live_entries {
                let child = child_path(&path, key);
                match snapshot.get(key) {
                    Some(snapshot_value) => {
                        diff_values(live_value, snapshot_value, child, delta, depth + 1);
                    }
                    None => {
                        delta.removed.insert(child, live_value.clone());
                    }
                }
            }
            for (key, snapshot_value) in snapshot_entries {
                if live.get(key).is_none() {
                    delta
                        .added
                        .insert(child_path(&path, key), snapshot_value.clone());
                }
            }
        }

        (Value::Array(_), Value::Array(_)) => {
            let (removed, added) = multiset_difference(live, snapshot);
            if !removed.is_empty() {
                delta.items_removed.insert(path.clone(), removed);
            }
            if !added.is_empty() {
                delta.items_added.insert(path, added);
            }
        }

        _ => {
            if !canonical_eq(live, snapshot) {
                delta.changed.insert(
                    path,
                    Change {
                        old: live.clone(),
                        new: snapshot.clone(),
                    },
                );
            }
        }
    }
}

/// Elements only in `live` and only in `snapshot`, counting repeats.
///
/// Canonicalizing a sequence sorts it, so one merge pass finds both sides.
fn multiset_difference(live: &Value, snapshot: &Value) -> (Vec<Value>, Vec<Value>) {
    let (Value::Array(live), Value::Array(snapshot)) = (canonicalize(live), canonicalize(snapshot))
    else {
        return (Vec::new(), Vec::new());
    };

    let mut removed = Vec::new();
    let mut added = Vec::new();
    let mut live = live.into_iter().peekable();
    let mut snapshot = snapshot.into_iter().peekable();

    loop {
        let order = match (live.peek(), snapshot.peek()) {
            (Some(l), Some(s)) => l.cmp_canonical(s),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match order {
            Ordering::Less => removed.extend(live.next()),
            Ordering::Greater => added.extend(snapshot.next()),
            Ordering::Equal => {
                live.next();
                snapshot.next();
            }
        }
    }
    (removed, added)
}
