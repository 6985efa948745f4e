//! Cells: named collections of records.

use crate::dir::CellFiles;
use crate::error::{CoreError, CoreResult};
use crate::filter::{Filter, Projection};
use crate::id::RecordId;
use crate::index::{load_specs, save_specs, FieldIndex, IndexSpec, PRIMARY_INDEX};
use crate::segment::{
    CompactionConfig, CompactionResult, Compactor, SegmentRecord, SegmentStore, SegmentUsage,
};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use zoo_codec::{from_cbor, to_cbor, Value, ID_KEY};
use zoo_storage::StorageBackend;

/// Handle to a cell.
///
/// Handles are cheap to clone and share one underlying cell. Every single
/// record operation is atomic; there are no multi-record transactions.
///
/// # Example
///
/// ```rust,ignore
/// use zoo_core::{Client, Filter, Projection};
///
/// let client = Client::in_memory();
/// let cell = client.database("zika")?.cell("survey")?;
///
/// let id = cell.insert(record)?;
/// let found = cell.find_one(&Filter::id(&id), &Projection::all())?;
/// ```
#[derive(Clone)]
pub struct Cell {
    inner: Arc<CellInner>,
}

struct CellInner {
    database: String,
    name: String,
    segment: SegmentStore,
    files: Option<CellFiles>,
    state: RwLock<CellState>,
    dropped: AtomicBool,
    compaction: CompactionConfig,
    /// Open scan cursors; compaction waits until there are none.
    scans: AtomicUsize,
}

#[derive(Default)]
struct CellState {
    /// `_id` -> offset of the live version.
    primary: HashMap<RecordId, u64>,
    indexes: Vec<FieldIndex>,
}

impl Cell {
    /// Opens a cell over its segment, rebuilding every index.
    ///
    /// A torn record at the end of the segment is truncated first, and the
    /// segment is compacted if `compaction` says so.
    pub(crate) fn open(
        database: &str,
        name: &str,
        backend: Box<dyn StorageBackend>,
        files: Option<CellFiles>,
        sync_on_write: bool,
        compaction: CompactionConfig,
    ) -> CoreResult<Self> {
        let segment = SegmentStore::new(backend, sync_on_write);
        segment.recover()?;

        let specs = match &files {
            Some(files) => load_specs(&files.index)?,
            None => Vec::new(),
        };

        let cell = Self {
            inner: Arc::new(CellInner {
                database: database.to_string(),
                name: name.to_string(),
                segment,
                files,
                state: RwLock::new(CellState::default()),
                dropped: AtomicBool::new(false),
                compaction,
                scans: AtomicUsize::new(0),
            }),
        };
        cell.rebuild(specs)?;
        cell.compact_if_needed()?;

        tracing::debug!(
            database,
            cell = name,
            records = cell.inner.state.read().primary.len(),
            "opened cell"
        );
        Ok(cell)
    }

    fn rebuild(&self, specs: Vec<IndexSpec>) -> CoreResult<()> {
        let mut primary = HashMap::new();
        for entry in self.inner.segment.scan()? {
            let (offset, record) = entry?;
            let known = primary.contains_key(&record.id);
            if record.flags.is_replacement() != known {
                return Err(CoreError::segment_corruption(format!(
                    "record {} at offset {offset}: {}",
                    record.id,
                    if known {
                        "inserted twice"
                    } else {
                        "replaces a record never inserted"
                    }
                )));
            }
            primary.insert(record.id, offset);
        }

        let mut indexes: Vec<FieldIndex> = specs.into_iter().map(FieldIndex::new).collect();
        if !indexes.is_empty() {
            for (id, &offset) in &primary {
                let record = self.load(offset)?;
                for index in &mut indexes {
                    index.insert(&record, id).map_err(|e| {
                        CoreError::invalid_format(format!("rebuilding index: {e}"))
                    })?;
                }
            }
        }

        *self.inner.state.write() = CellState { primary, indexes };
        Ok(())
    }

    /// Returns the cell name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the name of the database holding this cell.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.inner.database
    }

    /// Whether the cell behind this handle was dropped.
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        self.inner.dropped.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> CoreResult<()> {
        if self.is_dropped() {
            return Err(CoreError::CellDropped {
                database: self.inner.database.clone(),
                cell: self.inner.name.clone(),
            });
        }
        Ok(())
    }

    fn load(&self, offset: u64) -> CoreResult<Value> {
        let record = self.inner.segment.read_at(offset)?;
        Ok(from_cbor(&record.payload)?)
    }

    /// Inserts a record, returning its identifier.
    ///
    /// A record without `_id` is given a fresh one, appended as its last
    /// key.
    ///
    /// # Errors
    ///
    /// - `InvalidRecord` if the record is not a map or its `_id` is not text
    /// - `DuplicateKey` if the `_id` or a unique index key is already taken;
    ///   nothing is written
    pub fn insert(&self, mut record: Value) -> CoreResult<RecordId> {
        self.ensure_live()?;
        check_document(&record)?;

        let id = match record.get(ID_KEY) {
            Some(Value::Text(id)) => RecordId::from(id.as_str()),
            Some(other) => {
                return Err(CoreError::invalid_record(format!(
                    "_id must be text, found {}",
                    other.kind()
                )))
            }
            None => {
                let id = RecordId::new();
                record.insert(ID_KEY, Value::from(id.clone()));
                id
            }
        };

        let mut state = self.inner.state.write();
        if state.primary.contains_key(&id) {
            return Err(CoreError::duplicate_key(
                PRIMARY_INDEX,
                format!("{:?}", id.as_str()),
            ));
        }
        for index in &state.indexes {
            index.check(&record, &id)?;
        }

        let payload = to_cbor(&record)?;
        let offset = self
            .inner
            .segment
            .append(&SegmentRecord::insert(id.clone(), payload))?;

        state.primary.insert(id.clone(), offset);
        for index in &mut state.indexes {
            index.insert(&record, &id)?;
        }

        tracing::trace!(cell = %self.inner.name, id = %id, offset, "inserted record");
        Ok(id)
    }

    /// Replaces the record `id` in full.
    ///
    /// The new record's `_id` is forced to `id`. Returns false when no
    /// record has that identifier.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the new content takes a unique index key held by
    /// another record; the stored record is left unchanged.
    pub fn replace(&self, id: &RecordId, mut record: Value) -> CoreResult<bool> {
        self.ensure_live()?;
        check_document(&record)?;
        record.insert(ID_KEY, Value::from(id.clone()));

        let mut state = self.inner.state.write();
        let Some(&old_offset) = state.primary.get(id) else {
            return Ok(false);
        };
        for index in &state.indexes {
            index.check(&record, id)?;
        }
        let old = if state.indexes.is_empty() {
            Value::Null
        } else {
            self.load(old_offset)?
        };

        let payload = to_cbor(&record)?;
        let offset = self
            .inner
            .segment
            .append(&SegmentRecord::replacement(id.clone(), payload))?;

        state.primary.insert(id.clone(), offset);
        for index in &mut state.indexes {
            index.remove(&old, id);
            index.insert(&record, id)?;
        }

        tracing::trace!(cell = %self.inner.name, id = %id, offset, "replaced record");
        Ok(true)
    }

    /// Fetches a record by identifier.
    pub fn get(&self, id: &RecordId) -> CoreResult<Option<Value>> {
        self.ensure_live()?;
        let offset = self.inner.state.read().primary.get(id).copied();
        offset.map(|offset| self.load(offset)).transpose()
    }

    /// Returns the first record matching `filter`, projected.
    pub fn find_one(&self, filter: &Filter, projection: &Projection) -> CoreResult<Option<Value>> {
        let found = self.find(filter)?.next().transpose()?;
        Ok(found.map(|record| projection.apply(record)))
    }

    /// Returns a lazy cursor over the records matching `filter`.
    ///
    /// Without an `_id` clause or a clause on an indexed field, the cursor
    /// walks the segment in store order. Records written after the cursor
    /// was created are not visited.
    pub fn find(&self, filter: &Filter) -> CoreResult<Cursor> {
        self.ensure_live()?;

        let source = if let Some(id) = filter.pinned_id() {
            Source::Candidates(VecDeque::from([id]))
        } else {
            let state = self.inner.state.read();
            let indexed = filter.clauses().iter().find_map(|(path, value)| {
                state
                    .indexes
                    .iter()
                    .find(|index| index.spec().field == *path)
                    .map(|index| index.lookup(value).to_vec())
            });
            match indexed {
                Some(ids) => Source::Candidates(ids.into()),
                None => {
                    let end = self.inner.segment.size()?;
                    self.inner.scans.fetch_add(1, Ordering::AcqRel);
                    Source::Scan { offset: 0, end }
                }
            }
        };

        Ok(Cursor {
            cell: self.clone(),
            filter: filter.clone(),
            scanning: matches!(source, Source::Scan { .. }),
            source,
        })
    }

    /// Creates an index on a dotted field path, named after the path.
    ///
    /// Returns false, without changes, when an index with that name already
    /// exists. The `_id` field is always indexed.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` when `unique` is set and existing records already
    /// share a key; no index is created.
    pub fn create_index(&self, path: &str, unique: bool) -> CoreResult<bool> {
        self.ensure_live()?;
        if path.is_empty() {
            return Err(CoreError::invalid_record("index path is empty"));
        }
        if path == ID_KEY || path == PRIMARY_INDEX {
            return Ok(false);
        }

        let mut state = self.inner.state.write();
        if state.indexes.iter().any(|index| index.spec().name == path) {
            return Ok(false);
        }

        let spec = IndexSpec::new(path);
        let mut index = FieldIndex::new(if unique { spec.unique() } else { spec });
        for (id, &offset) in &state.primary {
            index.insert(&self.load(offset)?, id)?;
        }
        state.indexes.push(index);

        if let Some(files) = &self.inner.files {
            let specs: Vec<IndexSpec> = state
                .indexes
                .iter()
                .map(|index| index.spec().clone())
                .collect();
            if let Err(e) = save_specs(&files.index, &specs) {
                state.indexes.pop();
                return Err(e);
            }
        }

        tracing::info!(cell = %self.inner.name, index = path, unique, "created index");
        Ok(true)
    }

    /// Lists the indexes of this cell, the implicit `_id_` first.
    pub fn index_information(&self) -> CoreResult<Vec<IndexSpec>> {
        self.ensure_live()?;
        let state = self.inner.state.read();
        Ok(std::iter::once(IndexSpec::primary())
            .chain(state.indexes.iter().map(|index| index.spec().clone()))
            .collect())
    }

    /// Number of records in the cell.
    pub fn count(&self) -> CoreResult<usize> {
        self.ensure_live()?;
        Ok(self.inner.state.read().primary.len())
    }

    /// Byte usage of the cell's segment.
    pub fn usage(&self) -> CoreResult<SegmentUsage> {
        self.ensure_live()?;
        let state = self.inner.state.read();
        self.usage_of(&state)
    }

    fn usage_of(&self, state: &CellState) -> CoreResult<SegmentUsage> {
        let mut live_bytes = 0;
        for &offset in state.primary.values() {
            live_bytes += self.inner.segment.record_len_at(offset)?;
        }
        Ok(SegmentUsage {
            total_bytes: self.inner.segment.size()?,
            live_bytes,
        })
    }

    /// Rewrites the segment without superseded record versions.
    ///
    /// Returns `None`, changing nothing, while a scanning cursor is open.
    pub fn compact(&self) -> CoreResult<Option<CompactionResult>> {
        self.ensure_live()?;
        let mut state = self.inner.state.write();
        self.compact_locked(&mut state)
    }

    /// Compacts when the dead bytes pass the configured thresholds.
    pub fn compact_if_needed(&self) -> CoreResult<Option<CompactionResult>> {
        self.ensure_live()?;
        let mut state = self.inner.state.write();
        let usage = self.usage_of(&state)?;
        if !self.inner.compaction.should_compact(usage) {
            return Ok(None);
        }
        self.compact_locked(&mut state)
    }

    fn compact_locked(&self, state: &mut CellState) -> CoreResult<Option<CompactionResult>> {
        if self.inner.scans.load(Ordering::Acquire) > 0 {
            tracing::debug!(cell = %self.inner.name, "compaction deferred, scan in progress");
            return Ok(None);
        }

        let records = self
            .inner
            .segment
            .scan()?
            .map(|entry| entry.map(|(_, record)| record))
            .collect::<CoreResult<Vec<_>>>()?;
        let (live, result) = Compactor::compact(records);
        let offsets = self.inner.segment.rewrite(&live)?;
        state.primary = live.into_iter().map(|record| record.id).zip(offsets).collect();

        tracing::info!(
            database = %self.inner.database,
            cell = %self.inner.name,
            removed = result.obsolete_versions_removed,
            bytes_saved = result.bytes_saved,
            "compacted segment"
        );
        Ok(Some(result))
    }

    /// Deletes the cell with all its records and indexes.
    ///
    /// Every handle to the cell becomes stale; dropping twice is a no-op.
    pub fn drop(&self) -> CoreResult<()> {
        if self.inner.dropped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        *self.inner.state.write() = CellState::default();
        self.inner.segment.clear()?;
        if let Some(files) = &self.inner.files {
            files.remove()?;
        }

        tracing::info!(
            database = %self.inner.database,
            cell = %self.inner.name,
            "dropped cell"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("database", &self.inner.database)
            .field("name", &self.inner.name)
            .field("dropped", &self.is_dropped())
            .finish_non_exhaustive()
    }
}

fn check_document(record: &Value) -> CoreResult<()> {
    if record.as_map().is_none() {
        return Err(CoreError::invalid_record(format!(
            "record must be a map, found {}",
            record.kind()
        )));
    }
    Ok(())
}

enum Source {
    Scan { offset: u64, end: u64 },
    Candidates(VecDeque<RecordId>),
}

/// Lazy iterator over the records matching a filter.
///
/// Holds no lock between items; each step reads one record. A cursor that
/// walks the segment holds off compaction until it is dropped.
pub struct Cursor {
    cell: Cell,
    filter: Filter,
    source: Source,
    scanning: bool,
}

impl Cursor {
    fn step(&mut self) -> CoreResult<Option<Value>> {
        self.cell.ensure_live()?;
        match &mut self.source {
            Source::Candidates(ids) => {
                while let Some(id) = ids.pop_front() {
                    if let Some(record) = self.cell.get(&id)? {
                        if self.filter.matches(&record) {
                            return Ok(Some(record));
                        }
                    }
                }
                Ok(None)
            }
            Source::Scan { offset, end } => {
                while *offset < *end {
                    let at = *offset;
                    let record = self.cell.inner.segment.read_at(at)?;
                    *offset += record.encoded_size() as u64;

                    let live = self.cell.inner.state.read().primary.get(&record.id) == Some(&at);
                    if !live {
                        continue;
                    }
                    let value = from_cbor(&record.payload)?;
                    if self.filter.matches(&value) {
                        return Ok(Some(value));
                    }
                }
                Ok(None)
            }
        }
    }

    fn finish(&mut self) {
        self.source = Source::Candidates(VecDeque::new());
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if self.scanning {
            self.cell.inner.scans.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

impl Iterator for Cursor {
    type Item = CoreResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("cell", &self.cell.inner.name)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoo_codec::from_json_line;
    use zoo_storage::InMemoryBackend;

    fn create_cell() -> Cell {
        Cell::open(
            "zika",
            "survey",
            Box::new(InMemoryBackend::new()),
            None,
            false,
            CompactionConfig::default(),
        )
        .unwrap()
    }

    fn rec(json: &str) -> Value {
        from_json_line(json).unwrap()
    }

    #[test]
    fn insert_assigns_missing_id() {
        let cell = create_cell();
        let id = cell.insert(rec(r#"{"a": 1}"#)).unwrap();

        let stored = cell.get(&id).unwrap().unwrap();
        assert_eq!(RecordId::of(&stored), Some(id));
        assert_eq!(stored.as_map().unwrap().last().unwrap().0, ID_KEY);
        assert_eq!(cell.count().unwrap(), 1);
    }

    #[test]
    fn insert_keeps_given_id() {
        let cell = create_cell();
        let id = cell.insert(rec(r#"{"_id": "KX369547", "a": 1}"#)).unwrap();
        assert_eq!(id.as_str(), "KX369547");
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let cell = create_cell();
        cell.insert(rec(r#"{"_id": "x", "a": 1}"#)).unwrap();

        let err = cell.insert(rec(r#"{"_id": "x", "a": 2}"#)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { ref index, .. } if index == PRIMARY_INDEX));
        assert_eq!(cell.count().unwrap(), 1);
        assert_eq!(
            cell.get(&RecordId::from("x")).unwrap().unwrap().get("a"),
            Some(&Value::from(1))
        );
    }

    #[test]
    fn invalid_records_are_rejected() {
        let cell = create_cell();
        assert!(matches!(
            cell.insert(Value::from(1)),
            Err(CoreError::InvalidRecord { .. })
        ));
        assert!(matches!(
            cell.insert(rec(r#"{"_id": 5}"#)),
            Err(CoreError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn replace_updates_in_place() {
        let cell = create_cell();
        let id = cell.insert(rec(r#"{"a": 1}"#)).unwrap();

        assert!(cell.replace(&id, rec(r#"{"a": 2, "_id": "ignored"}"#)).unwrap());
        let stored = cell.get(&id).unwrap().unwrap();
        assert_eq!(stored.get("a"), Some(&Value::from(2)));
        assert_eq!(RecordId::of(&stored), Some(id));
        assert_eq!(cell.count().unwrap(), 1);

        assert!(!cell.replace(&RecordId::from("absent"), rec("{}")).unwrap());
    }

    #[test]
    fn find_walks_live_versions_in_store_order() {
        let cell = create_cell();
        let a = cell.insert(rec(r#"{"_id": "a", "n": 1}"#)).unwrap();
        cell.insert(rec(r#"{"_id": "b", "n": 2}"#)).unwrap();
        cell.replace(&a, rec(r#"{"n": 3}"#)).unwrap();

        let found: Vec<Value> = cell.find(&Filter::all()).unwrap().map(Result::unwrap).collect();
        let ids: Vec<&str> = found.iter().map(|r| r.get(ID_KEY).unwrap().as_text().unwrap()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(found[1].get("n"), Some(&Value::from(3)));
    }

    #[test]
    fn find_filters_by_path() {
        let cell = create_cell();
        cell.insert(rec(r#"{"host": {"species": "Avian"}, "n": 1}"#)).unwrap();
        cell.insert(rec(r#"{"host": {"species": "Human"}, "n": 2}"#)).unwrap();

        let found: Vec<Value> = cell
            .find(&Filter::eq("host.species", "Human"))
            .unwrap()
            .collect::<CoreResult<_>>()
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("n"), Some(&Value::from(2)));
    }

    #[test]
    fn find_one_applies_projection() {
        let cell = create_cell();
        let id = cell.insert(rec(r#"{"a": 1, "b": 2}"#)).unwrap();

        let found = cell
            .find_one(&Filter::id(&id), &Projection::exclude([ID_KEY, "b"]))
            .unwrap()
            .unwrap();
        assert_eq!(found, rec(r#"{"a": 1}"#));
        assert!(cell
            .find_one(&Filter::eq("a", 9), &Projection::all())
            .unwrap()
            .is_none());
    }

    #[test]
    fn cursor_skips_records_written_after_creation() {
        let cell = create_cell();
        cell.insert(rec(r#"{"n": 1}"#)).unwrap();

        let mut cursor = cell.find(&Filter::all()).unwrap();
        cell.insert(rec(r#"{"n": 2}"#)).unwrap();
        assert!(cursor.next().is_some());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn unique_index_enforced_on_insert_and_replace() {
        let cell = create_cell();
        assert!(cell.create_index("genbank.a", true).unwrap());
        assert!(!cell.create_index("genbank.a", true).unwrap());

        cell.insert(rec(r#"{"genbank": {"a": "A1"}}"#)).unwrap();
        let b = cell.insert(rec(r#"{"genbank": {"a": "B2"}}"#)).unwrap();
        assert!(cell.insert(rec(r#"{"genbank": {"a": "A1"}}"#)).unwrap_err().is_duplicate_key());
        assert!(cell.replace(&b, rec(r#"{"genbank": {"a": "A1"}}"#)).unwrap_err().is_duplicate_key());

        cell.replace(&b, rec(r#"{"genbank": {"a": "C3"}}"#)).unwrap();
        cell.insert(rec(r#"{"genbank": {"a": "B2"}}"#)).unwrap();
        assert_eq!(cell.count().unwrap(), 3);
    }

    #[test]
    fn indexed_find_uses_lookup() {
        let cell = create_cell();
        cell.create_index("acc", false).unwrap();
        cell.insert(rec(r#"{"acc": "A1", "n": 1}"#)).unwrap();
        cell.insert(rec(r#"{"acc": "A1", "n": 2}"#)).unwrap();
        cell.insert(rec(r#"{"acc": "B2", "n": 3}"#)).unwrap();

        assert_eq!(cell.find(&Filter::eq("acc", "A1")).unwrap().count(), 2);
        assert_eq!(cell.find(&Filter::eq("acc", "A1").and("n", 2)).unwrap().count(), 1);
    }

    #[test]
    fn create_unique_index_over_duplicates_fails() {
        let cell = create_cell();
        cell.insert(rec(r#"{"acc": "A1"}"#)).unwrap();
        cell.insert(rec(r#"{"acc": "A1"}"#)).unwrap();

        assert!(cell.create_index("acc", true).unwrap_err().is_duplicate_key());
        let names: Vec<String> = cell
            .index_information()
            .unwrap()
            .into_iter()
            .map(|spec| spec.name)
            .collect();
        assert_eq!(names, [PRIMARY_INDEX]);
    }

    #[test]
    fn index_information_lists_primary_first() {
        let cell = create_cell();
        cell.create_index("genbank.a", true).unwrap();
        let info = cell.index_information().unwrap();
        assert_eq!(info[0], IndexSpec::primary());
        assert_eq!(info[1], IndexSpec::new("genbank.a").unique());
        assert!(!cell.create_index(ID_KEY, true).unwrap());
    }

    #[test]
    fn dropped_handles_are_stale() {
        let cell = create_cell();
        let other = cell.clone();
        cell.insert(rec(r#"{"a": 1}"#)).unwrap();

        cell.drop().unwrap();
        cell.drop().unwrap();
        assert!(other.is_dropped());
        assert!(matches!(other.count(), Err(CoreError::CellDropped { .. })));
        assert!(matches!(
            other.insert(rec("{}")),
            Err(CoreError::CellDropped { .. })
        ));
    }

    #[test]
    fn cursor_reports_drop_once() {
        let cell = create_cell();
        cell.insert(rec(r#"{"a": 1}"#)).unwrap();
        let mut cursor = cell.find(&Filter::all()).unwrap();
        cell.drop().unwrap();

        assert!(matches!(cursor.next(), Some(Err(CoreError::CellDropped { .. }))));
        assert!(cursor.next().is_none());
    }

    #[test]
    fn reopening_rebuilds_from_segment() {
        let cell = create_cell();
        let id = cell.insert(rec(r#"{"a": 1}"#)).unwrap();
        cell.replace(&id, rec(r#"{"a": 2}"#)).unwrap();
        cell.insert(rec(r#"{"a": 3}"#)).unwrap();

        let mut bytes = Vec::new();
        for entry in cell.inner.segment.scan().unwrap() {
            bytes.extend(entry.unwrap().1.encode().unwrap());
        }

        let reopened = Cell::open(
            "zika",
            "survey",
            Box::new(InMemoryBackend::with_data(bytes)),
            None,
            false,
            CompactionConfig::disabled(),
        )
        .unwrap();
        assert_eq!(reopened.count().unwrap(), 2);
        assert_eq!(
            reopened.get(&id).unwrap().unwrap().get("a"),
            Some(&Value::from(2))
        );
    }

    #[test]
    fn compaction_bounds_a_replace_heavy_segment() {
        let cell = create_cell();
        let first = cell.insert(rec(r#"{"a": 0}"#)).unwrap();
        let second = cell.insert(rec(r#"{"b": 0}"#)).unwrap();
        for n in 1..=200 {
            cell.replace(&first, rec(&format!(r#"{{"a": {n}}}"#))).unwrap();
        }
        let before = cell.usage().unwrap();
        assert!(before.dead_bytes() > before.live_bytes);

        let result = cell.compact_if_needed().unwrap().unwrap();
        assert_eq!(result.obsolete_versions_removed, 200);
        let after = cell.usage().unwrap();
        assert_eq!(after.dead_bytes(), 0);
        assert_eq!(after.total_bytes, before.live_bytes);

        assert_eq!(cell.count().unwrap(), 2);
        assert_eq!(
            cell.get(&first).unwrap().unwrap().get("a"),
            Some(&Value::from(200))
        );
        let order: Vec<Value> = cell
            .find(&Filter::all())
            .unwrap()
            .map(|r| r.unwrap().get(ID_KEY).cloned().unwrap())
            .collect();
        assert_eq!(
            order,
            [Value::from(second.as_str()), Value::from(first.as_str())]
        );
        assert!(cell.compact_if_needed().unwrap().is_none());
    }

    #[test]
    fn compaction_waits_for_open_scans() {
        let cell = create_cell();
        let id = cell.insert(rec(r#"{"a": 1}"#)).unwrap();
        cell.replace(&id, rec(r#"{"a": 2}"#)).unwrap();

        let cursor = cell.find(&Filter::all()).unwrap();
        assert!(cell.compact().unwrap().is_none());
        assert!(cell.usage().unwrap().dead_bytes() > 0);
        drop(cursor);

        let result = cell.compact().unwrap().unwrap();
        assert_eq!(result.obsolete_versions_removed, 1);
        assert_eq!(cell.usage().unwrap().dead_bytes(), 0);
    }

    #[test]
    fn indexes_survive_compaction() {
        let cell = create_cell();
        cell.create_index("tag", true).unwrap();
        let id = cell.insert(rec(r#"{"tag": "x"}"#)).unwrap();
        cell.replace(&id, rec(r#"{"tag": "y"}"#)).unwrap();
        cell.compact().unwrap().unwrap();

        let filter = Filter::eq("tag", Value::from("y"));
        assert_eq!(cell.find(&filter).unwrap().count(), 1);
        assert!(matches!(
            cell.insert(rec(r#"{"tag": "y"}"#)),
            Err(CoreError::DuplicateKey { .. })
        ));
        cell.insert(rec(r#"{"tag": "x"}"#)).unwrap();
    }

    #[test]
    fn opening_compacts_past_the_threshold() {
        let cell = create_cell();
        let id = cell.insert(rec(r#"{"a": 0}"#)).unwrap();
        for n in 1..=400 {
            cell.replace(&id, rec(&format!(r#"{{"a": {n}, "pad": "{}"}}"#, "x".repeat(16))))
                .unwrap();
        }
        let mut bytes = Vec::new();
        for entry in cell.inner.segment.scan().unwrap() {
            bytes.extend(entry.unwrap().1.encode().unwrap());
        }

        let reopened = Cell::open(
            "zika",
            "survey",
            Box::new(InMemoryBackend::with_data(bytes)),
            None,
            false,
            CompactionConfig::default(),
        )
        .unwrap();
        assert_eq!(reopened.usage().unwrap().dead_bytes(), 0);
        assert_eq!(
            reopened.get(&id).unwrap().unwrap().get("a"),
            Some(&Value::from(400))
        );
    }
}
