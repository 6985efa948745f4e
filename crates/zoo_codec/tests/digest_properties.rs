//! Property tests for the canonical digest.

use proptest::prelude::*;
use zoo_codec::{digest_record, from_json_line, to_json_line, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        "[a-zA-Z0-9 ]{0,8}".prop_map(Value::Text),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|m| Value::map(m.into_iter())),
        ]
    })
}

fn record() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z_]{1,8}", value(), 0..8).prop_map(|m| Value::map(m.into_iter()))
}

/// Reverses every map and array, at every depth.
fn reversed(value: &Value) -> Value {
    match value {
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), reversed(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().rev().map(reversed).collect()),
        other => other.clone(),
    }
}

/// Rotates every map and array left by `by`, at every depth.
fn rotated(value: &Value, by: usize) -> Value {
    match value {
        Value::Map(entries) if !entries.is_empty() => {
            let mut entries: Vec<(String, Value)> = entries
                .iter()
                .map(|(k, v)| (k.clone(), rotated(v, by)))
                .collect();
            let len = entries.len();
            entries.rotate_left(by % len);
            Value::Map(entries)
        }
        Value::Array(items) if !items.is_empty() => {
            let mut items: Vec<Value> = items.iter().map(|v| rotated(v, by)).collect();
            let len = items.len();
            items.rotate_left(by % len);
            Value::Array(items)
        }
        other => other.clone(),
    }
}

proptest! {
    #[test]
    fn digest_ignores_reversal(r in record()) {
        prop_assert_eq!(digest_record(&r), digest_record(&reversed(&r)));
    }

    #[test]
    fn digest_ignores_rotation(r in record(), by in 0usize..7) {
        prop_assert_eq!(digest_record(&r), digest_record(&rotated(&r, by)));
    }

    #[test]
    fn digest_ignores_id_and_stale_digest(r in record(), id in "[a-f0-9-]{8,36}", stale in "[a-f0-9]{32}") {
        let mut tagged = r.clone();
        tagged.insert("_id", Value::Text(id));
        tagged.insert("digest", Value::Text(stale.clone()));
        tagged.insert("md5", Value::Text(stale));
        prop_assert_eq!(digest_record(&r), digest_record(&tagged));
    }

    #[test]
    fn digest_survives_json_round_trip(r in record()) {
        let line = to_json_line(&r).unwrap();
        let back = from_json_line(&line).unwrap();
        prop_assert_eq!(digest_record(&r), digest_record(&back));
    }

    #[test]
    fn new_field_changes_digest(r in record(), extra in value()) {
        let mut grown = r.clone();
        grown.insert("zz_extra_field", extra);
        prop_assert_ne!(digest_record(&r), digest_record(&grown));
    }
}
