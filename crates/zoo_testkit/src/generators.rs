//! Property-based test generators using proptest.
//!
//! Provides strategies for generating records and names, and a helper that
//! reorders a record without changing its content.

use proptest::prelude::*;
use zoo_codec::Value;

/// Strategy for generating valid database and cell names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,31}")
        .expect("Invalid regex")
        .prop_filter("Name must not be the lock file", |s| s != "LOCK")
}

/// Strategy for generating field names, reserved keys excluded.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,7}")
        .expect("Invalid regex")
        .prop_filter("Key must not be reserved", |k| k != "digest" && k != "md5")
}

/// Strategy for generating scalar values.
///
/// Floats are quarter steps, exact in binary and never integral, so they
/// survive a JSON round trip unchanged.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-4000i32..4000).prop_map(|n| Value::Float(f64::from(n) + 0.25)),
        "[ -~]{0,12}".prop_map(Value::Text),
    ]
}

/// Strategy for generating nested values up to a few levels deep.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map(key_strategy(), inner, 0..5)
                .prop_map(|entries| Value::map(entries)),
        ]
    })
}

/// Strategy for generating top-level records without `_id`.
pub fn record_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..8)
        .prop_map(|entries| Value::map(entries))
}

/// Strategy for generating a batch of records.
pub fn records_strategy(max: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(record_strategy(), 0..max)
}

/// Reorders every map and every sequence in `value`, driven by `seed`.
///
/// The result has the same content as `value`: only key order and element
/// order change.
pub fn reorder(value: &Value, seed: u64) -> Value {
    match value {
        Value::Map(entries) => {
            let mut reordered: Vec<(String, Value)> = entries
                .iter()
                .map(|(k, v)| (k.clone(), reorder(v, seed.rotate_left(7))))
                .collect();
            shuffle(&mut reordered, seed);
            Value::Map(reordered)
        }
        Value::Array(items) => {
            let mut reordered: Vec<Value> = items
                .iter()
                .map(|v| reorder(v, seed.rotate_left(13)))
                .collect();
            shuffle(&mut reordered, seed);
            Value::Array(reordered)
        }
        scalar => scalar.clone(),
    }
}

/// Deterministic Fisher-Yates shuffle over a xorshift stream.
fn shuffle<T>(items: &mut [T], seed: u64) {
    let mut state = seed | 1;
    for i in (1..items.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let j = (state % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
