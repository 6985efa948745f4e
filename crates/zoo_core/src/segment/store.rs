//! Append-only segment access.

use crate::error::{CoreError, CoreResult};
use crate::segment::record::SegmentRecord;
use parking_lot::RwLock;
use zoo_storage::StorageBackend;

/// Reads and appends framed records on one storage backend.
pub struct SegmentStore {
    backend: RwLock<Box<dyn StorageBackend>>,
    sync_on_write: bool,
}

impl SegmentStore {
    /// Wraps a backend.
    pub fn new(backend: Box<dyn StorageBackend>, sync_on_write: bool) -> Self {
        Self {
            backend: RwLock::new(backend),
            sync_on_write,
        }
    }

    /// Cuts off a torn record left at the end by an interrupted append.
    ///
    /// Walks the length fields from the start; the first record whose
    /// header or body extends past the end marks the tail. Returns the
    /// number of bytes discarded.
    pub fn recover(&self) -> CoreResult<u64> {
        let mut backend = self.backend.write();
        let size = backend.size()?;
        let mut offset = 0u64;

        while offset < size {
            if offset + 4 > size {
                break;
            }
            let len_bytes = backend.read_at(offset, 4)?;
            let record_len = u64::from(SegmentRecord::read_len(&len_bytes));
            if record_len == 0 {
                return Err(CoreError::segment_corruption(format!(
                    "zero-length record at offset {offset}"
                )));
            }
            if offset + record_len > size {
                break;
            }
            offset += record_len;
        }

        if offset < size {
            tracing::warn!(
                valid = offset,
                discarded = size - offset,
                "truncating torn segment tail"
            );
            backend.truncate(offset)?;
            backend.sync()?;
        }
        Ok(size - offset)
    }

    /// Appends a record, returning the offset it was written at.
    pub fn append(&self, record: &SegmentRecord) -> CoreResult<u64> {
        let encoded = record.encode()?;
        let mut backend = self.backend.write();
        let offset = backend.append(&encoded)?;
        backend.flush()?;
        if self.sync_on_write {
            backend.sync()?;
        }
        Ok(offset)
    }

    /// Reads the record at `offset`.
    pub fn read_at(&self, offset: u64) -> CoreResult<SegmentRecord> {
        let backend = self.backend.read();
        let size = backend.size()?;

        if offset + 4 > size {
            return Err(CoreError::segment_corruption("offset beyond segment"));
        }

        let len_bytes = backend.read_at(offset, 4)?;
        let record_len = SegmentRecord::read_len(&len_bytes) as usize;
        if offset + record_len as u64 > size {
            return Err(CoreError::segment_corruption(
                "record extends beyond segment",
            ));
        }

        let data = backend.read_at(offset, record_len)?;
        SegmentRecord::decode(&data)
    }

    /// Iterates over every record version present now, oldest first.
    ///
    /// Records appended after the scan starts are not visited.
    pub fn scan(&self) -> CoreResult<SegmentScan<'_>> {
        Ok(SegmentScan {
            store: self,
            offset: 0,
            end: self.size()?,
        })
    }

    /// Length of the record at `offset`, read from its header alone.
    pub fn record_len_at(&self, offset: u64) -> CoreResult<u64> {
        let len_bytes = self.backend.read().read_at(offset, 4)?;
        Ok(u64::from(SegmentRecord::read_len(&len_bytes)))
    }

    /// Replaces the whole segment with `records`, returning their new
    /// offsets in order.
    ///
    /// Offsets handed out before the rewrite are invalid afterwards.
    pub fn rewrite(&self, records: &[SegmentRecord]) -> CoreResult<Vec<u64>> {
        let mut buf = Vec::new();
        let mut offsets = Vec::with_capacity(records.len());
        for record in records {
            offsets.push(buf.len() as u64);
            buf.extend(record.encode()?);
        }

        self.backend.write().replace_contents(&buf)?;
        Ok(offsets)
    }

    /// Returns the current segment size.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.read().size()?)
    }

    /// Discards every record.
    pub fn clear(&self) -> CoreResult<()> {
        let mut backend = self.backend.write();
        backend.truncate(0)?;
        backend.sync()?;
        Ok(())
    }
}

impl std::fmt::Debug for SegmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentStore")
            .field("sync_on_write", &self.sync_on_write)
            .finish_non_exhaustive()
    }
}

/// Iterator over `(offset, record)` pairs of a segment.
pub struct SegmentScan<'a> {
    store: &'a SegmentStore,
    offset: u64,
    end: u64,
}

impl Iterator for SegmentScan<'_> {
    type Item = CoreResult<(u64, SegmentRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.end {
            return None;
        }
        let offset = self.offset;
        match self.store.read_at(offset) {
            Ok(record) => {
                self.offset += record.encoded_size() as u64;
                Some(Ok((offset, record)))
            }
            Err(e) => {
                self.offset = self.end;
                Some(Err(e))
            }
        }
    }
}
