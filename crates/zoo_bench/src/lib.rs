//! Benchmark utilities.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zoo_codec::{to_json_line, Value, ID_KEY};

const BASES: [char; 4] = ['A', 'C', 'G', 'T'];

/// Generate a random DNA sequence of the specified length.
pub fn random_sequence(rng: &mut impl Rng, len: usize) -> String {
    (0..len).map(|_| BASES[rng.gen_range(0..BASES.len())]).collect()
}

/// Generate a survey-like record with a sequence of `seq_len` bases.
pub fn random_record(rng: &mut impl Rng, n: usize, seq_len: usize) -> Value {
    let tags: Vec<Value> = (0..rng.gen_range(1..6))
        .map(|i| Value::Text(format!("tag{i}")))
        .collect();

    Value::map([
        (ID_KEY, Value::Text(format!("rec-{n:08}"))),
        (
            "genbank",
            Value::map([("a", Value::Text(format!("KX{:06}", rng.gen_range(0..1_000_000))))]),
        ),
        ("host", Value::from(["Avian", "Human", "Mosquito"][n % 3])),
        ("year", Value::Integer(rng.gen_range(1950..2020))),
        ("tags", Value::Array(tags)),
        ("sequence", Value::Text(random_sequence(rng, seq_len))),
    ])
}

/// Generate `count` records from a fixed seed.
pub fn generate_records(count: usize, seq_len: usize) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|n| random_record(&mut rng, n, seq_len))
        .collect()
}

/// Render records as snapshot text.
pub fn snapshot_text(records: &[Value]) -> String {
    records
        .iter()
        .map(|record| to_json_line(record).expect("record encodes") + "\n")
        .collect()
}
