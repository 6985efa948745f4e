//! # Zoo Sync
//!
//! Synchronizes Zoo cells with line-delimited JSON snapshots.
//!
//! This crate provides:
//! - Snapshot reading and writing (one JSON object per line)
//! - `init`, `add`, `commit`, `pull`, `diff`, `status` and `sample`
//! - Structural deltas between live and snapshot records
//! - MinHash signatures of the sequences in a committed cell, written in
//!   the sourmash signature format
//!
//! ## Sync model
//!
//! A snapshot is the exchange format. `commit` writes a cell out with a
//! content digest on every record; `pull` reads a snapshot back and
//! touches only the records whose digest differs from the stored one.
//! Pulling the same snapshot twice changes nothing the second time.
//!
//! ## Key Invariants
//!
//! - Digests ignore key order, sequence order, `_id`, `digest` and `md5`
//! - Snapshots are streamed; memory does not grow with snapshot size
//! - Records applied before a failure stay applied
//! - A pull that replaces records compacts the cell past its thresholds

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod delta;
mod error;
mod report;
mod signature;
mod snapshot;
mod synchronizer;

pub use config::{parse_ksizes, SyncConfig, DEFAULT_KSIZES, DEFAULT_NUM_HASHES};
pub use delta::{Change, Delta};
pub use error::{SyncError, SyncResult};
pub use report::{AddReport, CommitReport, DiffReport, InitReport, PullReport, StatusReport};
pub use signature::{hash_kmer, MinHash, SignatureSet, SignatureSink, HASH_SEED};
pub use snapshot::{SnapshotReader, SnapshotWriter};
pub use synchronizer::Synchronizer;
