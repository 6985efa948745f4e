//! Segment compaction.
//!
//! Replacing a record appends its new version; the old one stays behind as
//! dead bytes. Compaction rewrites a segment with only the live version of
//! each record.
//!
//! ## Invariants
//!
//! - Compaction never changes what a cell holds
//! - Records keep their store order (the order of their latest write)
//! - Every rewritten record is a plain insert

use crate::id::RecordId;
use crate::segment::record::SegmentRecord;
use std::collections::HashMap;

/// When a cell compacts its segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompactionConfig {
    /// Dead bytes below this never trigger compaction.
    pub min_dead_bytes: u64,
    /// Fraction of the segment that must be dead (0.0 to 1.0).
    pub min_dead_ratio: f64,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            min_dead_bytes: 4096,
            min_dead_ratio: 0.5,
        }
    }
}

impl CompactionConfig {
    /// A config that never compacts automatically.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            min_dead_bytes: u64::MAX,
            min_dead_ratio: 1.0,
        }
    }

    /// Whether a segment with this usage should be compacted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn should_compact(&self, usage: SegmentUsage) -> bool {
        let dead = usage.dead_bytes();
        dead > 0
            && dead >= self.min_dead_bytes
            && dead as f64 >= self.min_dead_ratio * usage.total_bytes as f64
    }
}

/// Byte usage of a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentUsage {
    /// Segment size.
    pub total_bytes: u64,
    /// Bytes held by live record versions.
    pub live_bytes: u64,
}

impl SegmentUsage {
    /// Bytes held by superseded versions.
    #[must_use]
    pub fn dead_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.live_bytes)
    }
}

/// Result of a compaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactionResult {
    /// Records read.
    pub input_records: usize,
    /// Records written.
    pub output_records: usize,
    /// Superseded versions dropped.
    pub obsolete_versions_removed: usize,
    /// Input size minus output size.
    pub bytes_saved: u64,
}

/// Keeps the latest version of every record.
///
/// ```ignore
/// let (live, result) = Compactor::compact(records);
/// assert_eq!(result.output_records, live.len());
/// ```
pub struct Compactor;

impl Compactor {
    /// Compacts records given in segment order.
    ///
    /// The output holds one insert per id, ordered by the position of that
    /// id's latest version in the input.
    #[must_use]
    pub fn compact(records: Vec<SegmentRecord>) -> (Vec<SegmentRecord>, CompactionResult) {
        let input_records = records.len();
        let input_size: usize = records.iter().map(SegmentRecord::encoded_size).sum();

        let mut slots: Vec<Option<SegmentRecord>> = Vec::with_capacity(records.len());
        let mut latest: HashMap<RecordId, usize> = HashMap::new();
        for record in records {
            if let Some(previous) = latest.insert(record.id.clone(), slots.len()) {
                slots[previous] = None;
            }
            slots.push(Some(SegmentRecord::insert(record.id, record.payload)));
        }

        let output: Vec<SegmentRecord> = slots.into_iter().flatten().collect();
        let output_size: usize = output.iter().map(SegmentRecord::encoded_size).sum();

        let result = CompactionResult {
            input_records,
            output_records: output.len(),
            obsolete_versions_removed: input_records - output.len(),
            bytes_saved: input_size.saturating_sub(output_size) as u64,
        };
        (output, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(id: &str, payload: &[u8]) -> SegmentRecord {
        SegmentRecord::insert(RecordId::from(id), payload.to_vec())
    }

    fn replacement(id: &str, payload: &[u8]) -> SegmentRecord {
        SegmentRecord::replacement(RecordId::from(id), payload.to_vec())
    }

    #[test]
    fn compact_keeps_latest_version_in_write_order() {
        let records = vec![
            insert("a", &[1]),
            insert("b", &[2]),
            replacement("a", &[3, 3]),
            insert("c", &[4]),
            replacement("b", &[5]),
        ];

        let (output, result) = Compactor::compact(records);

        let ids: Vec<&str> = output.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b"]);
        assert_eq!(output[0].payload, [3, 3]);
        assert!(output.iter().all(|r| !r.flags.is_replacement()));
        assert_eq!(result.input_records, 5);
        assert_eq!(result.output_records, 3);
        assert_eq!(result.obsolete_versions_removed, 2);
        assert!(result.bytes_saved > 0);
    }

    #[test]
    fn compact_without_replacements_is_identity() {
        let records = vec![insert("a", &[1]), insert("b", &[2])];
        let (output, result) = Compactor::compact(records.clone());
        assert_eq!(output, records);
        assert_eq!(result.obsolete_versions_removed, 0);
        assert_eq!(result.bytes_saved, 0);
    }

    #[test]
    fn thresholds_gate_compaction() {
        let config = CompactionConfig::default();
        let usage = |total_bytes, live_bytes| SegmentUsage {
            total_bytes,
            live_bytes,
        };

        assert!(!config.should_compact(usage(0, 0)));
        assert!(!config.should_compact(usage(3000, 100)));
        assert!(!config.should_compact(usage(20_000, 15_000)));
        assert!(config.should_compact(usage(20_000, 5_000)));
        assert!(!CompactionConfig::disabled().should_compact(usage(20_000, 0)));
    }
}
