//! The cell synchronizer.

use crate::config::SyncConfig;
use crate::delta::Delta;
use crate::error::{SyncError, SyncResult};
use crate::report::{AddReport, CommitReport, DiffReport, InitReport, PullReport, StatusReport};
use crate::signature::{SignatureSet, SignatureSink};
use crate::snapshot::{SnapshotReader, SnapshotWriter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use zoo_codec::{digest_record, stored_digest, strip_reserved, Digest, Value, ID_KEY};
use zoo_core::{Cell, Client, Database, Filter, Projection, RecordId};

/// Characters of the sequence field kept in a status example.
const EXAMPLE_SEQUENCE_CHARS: usize = 60;

/// Synchronizes cells with snapshot files.
///
/// Every operation streams: snapshot records are read one line at a time
/// and stored records one at a time from a cursor. Records applied before
/// a fatal error stay applied; operations are safe to re-run.
///
/// # Example
///
/// ```rust,ignore
/// use zoo_core::Client;
/// use zoo_sync::{SyncConfig, Synchronizer};
///
/// let client = Client::open("zoo-data", Default::default())?;
/// let cell = client.database("zika")?.cell("survey")?;
/// let sync = Synchronizer::new(SyncConfig::default())?;
///
/// sync.commit(&cell, Path::new("survey"))?;       // survey.json + survey.zoo
/// let report = sync.pull(&cell, BufReader::new(File::open("survey.json")?))?;
/// println!("{report}");
/// ```
#[derive(Debug, Clone)]
pub struct Synchronizer {
    config: SyncConfig,
}

impl Synchronizer {
    /// Creates a synchronizer.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration does not validate.
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Loads a snapshot into a cell, giving every record a fresh `_id`.
    ///
    /// Any `_id` in the snapshot is replaced. Records rejected by a unique
    /// index already on the cell are counted as duplicates.
    pub fn init<R: BufRead>(&self, cell: &Cell, snapshot: R) -> SyncResult<InitReport> {
        let mut report = InitReport::default();

        for entry in SnapshotReader::new(snapshot) {
            let (line, mut record) = entry?;
            record.remove(ID_KEY);
            record.insert(ID_KEY, Value::from(RecordId::new()));

            match cell.insert(record) {
                Ok(_) => report.inserted += 1,
                Err(e) if e.is_duplicate_key() => {
                    tracing::debug!(line, error = %e, "duplicate skipped");
                    report.duplicates += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(
            cell = cell.name(),
            inserted = report.inserted,
            duplicates = report.duplicates,
            "initialized cell"
        );
        Ok(report)
    }

    /// Adds snapshot records that the cell does not hold yet.
    ///
    /// Duplicates are judged by the configured primary key. With `_id`,
    /// records without one get a fresh one. With any other path, a unique
    /// index on it is created first if missing; records where the path
    /// does not resolve are inserted with a warning.
    pub fn add<R: BufRead>(&self, cell: &Cell, snapshot: R) -> SyncResult<AddReport> {
        let primkey = self.config.primkey.as_str();
        let mut report = AddReport::default();

        if primkey != ID_KEY {
            let indexed = cell
                .index_information()?
                .iter()
                .any(|spec| spec.name == primkey);
            if !indexed && cell.create_index(primkey, true)? {
                report.index_created = Some(primkey.to_string());
            }
        }

        for entry in SnapshotReader::new(snapshot) {
            let (line, record) = entry?;

            if primkey != ID_KEY {
                match record.get_path(primkey) {
                    Some(key) => {
                        let filter = Filter::eq(primkey, key.clone());
                        let existing = cell.find_one(&filter, &Projection::all())?;
                        if existing.is_some() {
                            tracing::debug!(line, primkey, "duplicate skipped");
                            report.duplicates += 1;
                            continue;
                        }
                    }
                    None => {
                        tracing::warn!(line, primkey, "primary key does not resolve, inserting");
                        report.unkeyed += 1;
                    }
                }
            }

            match cell.insert(record) {
                Ok(_) => report.inserted += 1,
                Err(e) if e.is_duplicate_key() => {
                    tracing::debug!(line, error = %e, "duplicate skipped");
                    report.duplicates += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(
            cell = cell.name(),
            inserted = report.inserted,
            duplicates = report.duplicates,
            "added records"
        );
        Ok(report)
    }

    /// Commits a cell to `<prefix>.json` and its signatures to
    /// `<prefix>.zoo`.
    ///
    /// Read-only on the store.
    pub fn commit(&self, cell: &Cell, prefix: &Path) -> SyncResult<CommitReport> {
        let snapshot_path = with_suffix(prefix, ".json");
        let signature_path = with_suffix(prefix, ".zoo");

        let mut signatures = SignatureSet::new(cell.name(), &self.config.ksizes, self.config.num);
        let report = self.commit_to(cell, File::create(&snapshot_path)?, &mut signatures)?;

        let mut out = BufWriter::new(File::create(&signature_path)?);
        signatures.save_json(&mut out)?;
        out.flush()?;

        tracing::info!(
            cell = cell.name(),
            snapshot = %snapshot_path.display(),
            signatures = %signature_path.display(),
            committed = report.committed,
            "committed cell"
        );
        Ok(report)
    }

    /// Writes every record of the cell, stamped with a fresh digest, and
    /// feeds its sequence field to `sink`.
    pub fn commit_to<W: Write>(
        &self,
        cell: &Cell,
        writer: W,
        sink: &mut dyn SignatureSink,
    ) -> SyncResult<CommitReport> {
        let mut writer = SnapshotWriter::new(writer);
        let mut report = CommitReport::default();

        for record in cell.find(&Filter::all())? {
            let record = record?;
            writer.write_record(&self.stamp(&record))?;
            report.committed += 1;

            match record.get(&self.config.sequence_field) {
                Some(Value::Text(sequence)) => {
                    sink.add_sequence(sequence);
                    report.sequences += 1;
                }
                Some(other) => tracing::warn!(
                    id = ?record.get(ID_KEY),
                    field = %self.config.sequence_field,
                    kind = other.kind(),
                    "sequence field is not text, skipped"
                ),
                None => {}
            }
        }

        writer.finish()?.flush()?;
        Ok(report)
    }

    /// Strips `_id` and digests, then reattaches a fresh digest and `_id`.
    fn stamp(&self, record: &Value) -> Value {
        let digest = digest_record(record);
        let mut stamped = strip_reserved(record);
        stamped.insert(self.config.digest_field.as_str(), Value::Text(digest.to_hex()));
        if let Some(id) = record.get(ID_KEY) {
            stamped.insert(ID_KEY, id.clone());
        }
        stamped
    }

    /// Brings a cell up to date with a snapshot.
    ///
    /// Records new to the cell are inserted; records whose stored content
    /// no longer matches the snapshot digest are replaced in full. A
    /// snapshot record without a digest is hashed on the fly. A pull that
    /// replaced records compacts the cell once the superseded versions
    /// pass its compaction thresholds.
    ///
    /// # Errors
    ///
    /// `MissingField` for a record without a text `_id`.
    pub fn pull<R: BufRead>(&self, cell: &Cell, snapshot: R) -> SyncResult<PullReport> {
        let mut report = PullReport::default();

        for entry in SnapshotReader::new(snapshot) {
            let (line, record) = entry?;
            let id = RecordId::of(&record).ok_or_else(|| SyncError::missing_field(line, ID_KEY))?;

            let Some(stored) = cell.get(&id)? else {
                cell.insert(record)?;
                tracing::debug!(line, id = %id, "inserted");
                report.inserted += 1;
                continue;
            };

            if incoming_digest(&record) == Some(digest_record(&stored)) {
                report.unchanged += 1;
            } else {
                cell.replace(&id, record)?;
                tracing::debug!(line, id = %id, "replaced");
                report.replaced += 1;
            }
        }

        tracing::info!(
            cell = cell.name(),
            inserted = report.inserted,
            replaced = report.replaced,
            unchanged = report.unchanged,
            "pulled snapshot"
        );
        if report.replaced > 0 {
            cell.compact_if_needed()?;
        }
        Ok(report)
    }

    /// Writes one delta line per snapshot record that differs from the
    /// cell, live record first.
    ///
    /// # Errors
    ///
    /// `MissingField` for a record without a text `_id`.
    pub fn diff<R: BufRead, W: Write>(
        &self,
        cell: &Cell,
        snapshot: R,
        out: W,
    ) -> SyncResult<DiffReport> {
        let mut writer = SnapshotWriter::new(out);
        let mut report = DiffReport::default();

        for entry in SnapshotReader::new(snapshot) {
            let (line, record) = entry?;
            let id = RecordId::of(&record).ok_or_else(|| SyncError::missing_field(line, ID_KEY))?;

            match cell.get(&id)? {
                None => {
                    writer.write_json(&Delta::missing(id.as_str(), &record))?;
                    report.missing += 1;
                }
                Some(live) => {
                    let delta = Delta::compute(id.as_str(), &live, &record);
                    if delta.is_empty() {
                        report.identical += 1;
                    } else {
                        writer.write_json(&delta)?;
                        report.different += 1;
                    }
                }
            }
        }

        writer.finish()?.flush()?;
        tracing::info!(
            cell = cell.name(),
            identical = report.identical,
            different = report.different,
            missing = report.missing,
            "diffed snapshot"
        );
        Ok(report)
    }

    /// Drops a cell. Succeeds whether or not it existed.
    pub fn drop(&self, database: &Database, cell: &str) -> SyncResult<bool> {
        Ok(database.drop_cell(cell)?)
    }

    /// Drops a database with all its cells. Succeeds whether or not it
    /// existed.
    pub fn destroy(&self, client: &Client, database: &str) -> SyncResult<bool> {
        Ok(client.drop_database(database)?)
    }

    /// Counts a cell's records and optionally picks an example.
    ///
    /// The example's sequence field is shortened for display.
    pub fn status(&self, cell: &Cell, include_example: bool) -> SyncResult<StatusReport> {
        let example = if include_example {
            cell.find_one(&Filter::all(), &Projection::all())?
                .map(|record| self.shorten_sequence(record))
        } else {
            None
        };

        Ok(StatusReport {
            cell: cell.name().to_string(),
            count: cell.count()?,
            example,
        })
    }

    /// Status of every cell in a database, by cell name.
    pub fn status_all(&self, database: &Database) -> SyncResult<Vec<StatusReport>> {
        database
            .cell_names()?
            .iter()
            .map(|name| self.status(&database.cell(name)?, false))
            .collect()
    }

    fn shorten_sequence(&self, mut record: Value) -> Value {
        let field = self.config.sequence_field.as_str();
        let short = match record.get(field) {
            Some(Value::Text(sequence)) if sequence.chars().count() > EXAMPLE_SEQUENCE_CHARS => {
                Some(sequence.chars().take(EXAMPLE_SEQUENCE_CHARS).collect::<String>())
            }
            _ => None,
        };
        if let Some(short) = short {
            record.insert(field, Value::Text(format!("{short}...")));
        }
        record
    }

    /// Draws up to `size` records uniformly at random from those matching
    /// `filter`.
    ///
    /// Streams the cell once, keeping at most `size` records. The same
    /// `seed` over the same cell draws the same records.
    pub fn sample(
        &self,
        cell: &Cell,
        filter: &Filter,
        size: usize,
        seed: Option<u64>,
    ) -> SyncResult<Vec<Value>> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut reservoir = Vec::with_capacity(size);
        if size == 0 {
            return Ok(reservoir);
        }
        for (seen, record) in cell.find(filter)?.enumerate() {
            let record = record?;
            if seen < size {
                reservoir.push(record);
            } else {
                let slot = rng.gen_range(0..=seen);
                if slot < size {
                    reservoir[slot] = record;
                }
            }
        }

        tracing::debug!(cell = cell.name(), drawn = reservoir.len(), "sampled cell");
        Ok(reservoir)
    }
}

/// The digest a snapshot record claims, or its computed digest if it
/// claims none. A claimed digest in another format yields `None`.
fn incoming_digest(record: &Value) -> Option<Digest> {
    match stored_digest(record) {
        Some(text) => text.parse().ok(),
        None => Some(digest_record(record)),
    }
}

/// `prefix` with `suffix` appended to its last component.
fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use zoo_codec::{from_json_line, DIGEST_KEY, LEGACY_DIGEST_KEY};

    fn sync() -> Synchronizer {
        Synchronizer::new(SyncConfig::default()).unwrap()
    }

    fn cell() -> Cell {
        Client::in_memory()
            .database("zika")
            .unwrap()
            .cell("survey")
            .unwrap()
    }

    #[test]
    fn stamp_puts_digest_then_id_last() {
        let record = from_json_line(r#"{"_id": "x", "md5": "old", "a": 1}"#).unwrap();
        let stamped = sync().stamp(&record);
        let keys: Vec<&str> = stamped.as_map().unwrap().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a", DIGEST_KEY, ID_KEY]);

        let legacy = Synchronizer::new(SyncConfig::new().with_digest_field(LEGACY_DIGEST_KEY))
            .unwrap()
            .stamp(&record);
        assert_eq!(
            legacy.get(LEGACY_DIGEST_KEY).and_then(Value::as_text),
            Some(digest_record(&record).to_hex().as_str())
        );
    }

    #[test]
    fn incoming_digest_falls_back_to_content() {
        let plain = from_json_line(r#"{"_id": "x", "a": 1}"#).unwrap();
        assert_eq!(incoming_digest(&plain), Some(digest_record(&plain)));

        let legacy = from_json_line(r#"{"_id": "x", "a": 1, "md5": "0cc175b9c0f1b6a831c399e269772661"}"#)
            .unwrap();
        assert_eq!(incoming_digest(&legacy), None);
    }

    #[test]
    fn with_suffix_keeps_dots_in_prefix() {
        assert_eq!(
            with_suffix(Path::new("out/survey.2016"), ".json"),
            PathBuf::from("out/survey.2016.json")
        );
    }

    #[test]
    fn status_shortens_long_sequences() {
        let cell = cell();
        let sequence = "ACGT".repeat(40);
        cell.insert(Value::map([("sequence", Value::from(sequence.as_str()))]))
            .unwrap();

        let report = sync().status(&cell, true).unwrap();
        assert_eq!(report.count, 1);
        let shown = report.example.unwrap();
        let shown = shown.get("sequence").unwrap().as_text().unwrap();
        assert_eq!(shown.len(), EXAMPLE_SEQUENCE_CHARS + 3);
        assert!(shown.ends_with("..."));

        assert!(sync().status(&cell, false).unwrap().example.is_none());
    }

    #[test]
    fn sample_is_bounded_and_reproducible() {
        let cell = cell();
        for i in 0..50 {
            cell.insert(Value::map([("n", Value::from(i)), ("even", Value::from(i % 2 == 0))]))
                .unwrap();
        }

        let sync = sync();
        let first = sync.sample(&cell, &Filter::eq("even", true), 5, Some(7)).unwrap();
        let second = sync.sample(&cell, &Filter::eq("even", true), 5, Some(7)).unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert!(first.iter().all(|r| r.get("even") == Some(&Value::Bool(true))));

        assert_eq!(sync.sample(&cell, &Filter::all(), 100, None).unwrap().len(), 50);
        assert!(sync.sample(&cell, &Filter::all(), 0, None).unwrap().is_empty());
    }

    #[test]
    fn init_replaces_snapshot_ids() {
        let cell = cell();
        let input = "{\"_id\": \"given\", \"a\": 1}\n{\"a\": 2}\n";
        let report = sync().init(&cell, Cursor::new(input)).unwrap();
        assert_eq!(report.inserted, 2);
        assert!(cell.get(&RecordId::from("given")).unwrap().is_none());
    }
}
