//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores, cells and
//! snapshot files.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zoo_codec::{to_json_line, Value};
use zoo_core::{Cell, Client, Config};

/// Database name used by the fixtures.
pub const TEST_DATABASE: &str = "zika";

/// Cell name used by the fixtures.
pub const TEST_CELL: &str = "survey";

/// A test client with automatic cleanup.
pub struct TestClient {
    /// The client instance.
    pub client: Client,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestClient {
    /// Creates a new in-memory test client.
    pub fn memory() -> Self {
        Self {
            client: Client::in_memory(),
            temp_dir: None,
        }
    }

    /// Creates a new file-backed test client in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let client =
            Client::open(temp_dir.path(), Config::default()).expect("Failed to open store");
        Self {
            client,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store root if file-backed, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Closes and reopens a file-backed store, keeping its directory.
    ///
    /// Handles obtained from the old client must be dropped first.
    pub fn reopen(self) -> Self {
        let Self { client, temp_dir } = self;
        let temp_dir = temp_dir.expect("Only file-backed clients can be reopened");
        drop(client);
        let client =
            Client::open(temp_dir.path(), Config::default()).expect("Failed to reopen store");
        Self {
            client,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the fixture cell, `zika/survey`.
    pub fn cell(&self) -> Cell {
        self.named_cell(TEST_CELL)
    }

    /// Returns a cell of the fixture database.
    pub fn named_cell(&self, name: &str) -> Cell {
        self.client
            .database(TEST_DATABASE)
            .and_then(|db| db.cell(name))
            .expect("Failed to open cell")
    }
}

impl std::ops::Deref for TestClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Runs a test with the fixture cell of a temporary in-memory store.
///
/// # Example
///
/// ```rust,ignore
/// use zoo_testkit::with_temp_cell;
///
/// #[test]
/// fn my_test() {
///     with_temp_cell(|cell| {
///         cell.insert(record).unwrap();
///     });
/// }
/// ```
pub fn with_temp_cell<F, R>(f: F) -> R
where
    F: FnOnce(&Cell) -> R,
{
    let test_client = TestClient::memory();
    f(&test_client.cell())
}

/// Runs a test with the fixture cell of a temporary file-backed store.
pub fn with_file_cell<F, R>(f: F) -> R
where
    F: FnOnce(&Cell, &Path) -> R,
{
    let test_client = TestClient::file();
    let path = test_client.path().expect("File store should have a path");
    f(&test_client.cell(), path)
}

/// Renders records as snapshot text, one JSON object per line.
pub fn snapshot_text(records: &[Value]) -> String {
    records
        .iter()
        .map(|record| to_json_line(record).expect("Failed to encode record") + "\n")
        .collect()
}

/// Writes records to `<dir>/<name>` as a snapshot file.
pub fn write_snapshot(dir: &Path, name: &str, records: &[Value]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, snapshot_text(records)).expect("Failed to write snapshot");
    path
}

/// Parses snapshot text back into records, skipping blank lines.
pub fn read_snapshot_text(text: &str) -> Vec<Value> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| zoo_codec::from_json_line(line).expect("Failed to parse snapshot line"))
        .collect()
}

/// A survey record keyed by a GenBank accession under `genbank.a`.
pub fn survey_record(n: usize) -> Value {
    let hosts = ["Avian", "Human", "Mosquito"];
    let bases = ["ACGT", "TTGA", "CCAG", "GATC"];
    let sequence: String = (0..16).map(|i| bases[(n + i) % bases.len()]).collect();

    Value::map([
        (
            "genbank",
            Value::map([("a", Value::Text(format!("KX{:06}", 369_547 + n)))]),
        ),
        ("host", Value::from(hosts[n % hosts.len()])),
        ("year", Value::Integer(2015 + (n % 3) as i64)),
        ("tags", Value::from(vec!["zika", "survey"])),
        ("sequence", Value::Text(sequence)),
    ])
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates an in-memory store whose fixture cell holds `count` survey
    /// records.
    pub fn populated_client(count: usize) -> TestClient {
        let test_client = TestClient::memory();
        let cell = test_client.cell();
        for n in 0..count {
            cell.insert(survey_record(n)).expect("Failed to insert record");
        }
        test_client
    }

    /// Creates an in-memory store with `cell_count` cells of one record each.
    pub fn multi_cell_client(cell_count: usize) -> (TestClient, Vec<String>) {
        let test_client = TestClient::memory();
        let mut names = Vec::with_capacity(cell_count);

        for i in 0..cell_count {
            let name = format!("cell_{i}");
            test_client
                .named_cell(&name)
                .insert(survey_record(i))
                .expect("Failed to insert record");
            names.push(name);
        }

        (test_client, names)
    }
}
