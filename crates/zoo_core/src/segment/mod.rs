//! Segment storage for cell records.
//!
//! Each cell owns one append-only segment. Writing a record never touches
//! earlier bytes; replacing a record appends a new version and the older
//! one is skipped on read.
//!
//! ## Segment Record Format
//!
//! ```text
//! | record_len (4) | flags (1) | id_len (2) | id (N) | payload (M) | checksum (4) |
//! ```
//!
//! All integers are little-endian. `record_len` covers the whole record,
//! itself and the checksum included. The payload is the CBOR-encoded
//! record; the checksum is CRC-32 over everything before it.
//!
//! Flags:
//! - `0x01` = replacement (supersedes an earlier version of the same id)
//!
//! Superseded versions are reclaimed by [`Compactor`], which rewrites the
//! segment with the live versions only.

mod compaction;
mod record;
mod store;

pub use compaction::{CompactionConfig, CompactionResult, Compactor, SegmentUsage};
pub use record::{RecordFlags, SegmentRecord};
pub use store::{SegmentScan, SegmentStore};
