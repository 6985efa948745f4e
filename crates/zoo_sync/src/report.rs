//! Tallies returned by sync operations.
//!
//! Every report counts each processed record exactly once, so `total()`
//! equals the number of records the operation read.

use std::fmt;
use zoo_codec::Value;

/// Result of `init`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Records inserted under a fresh `_id`.
    pub inserted: usize,
    /// Records rejected by a unique secondary index.
    pub duplicates: usize,
}

impl InitReport {
    /// Records processed.
    pub fn total(&self) -> usize {
        self.inserted + self.duplicates
    }
}

impl fmt::Display for InitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} entries inserted.", self.inserted)?;
        if self.duplicates > 0 {
            write!(f, " {} duplicates skipped.", self.duplicates)?;
        }
        write!(f, " Primary key assigned to field \"_id\".")
    }
}

/// Result of `add`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    /// Records inserted.
    pub inserted: usize,
    /// Records skipped because their key was already present.
    pub duplicates: usize,
    /// Inserted records whose primary key path did not resolve.
    pub unkeyed: usize,
    /// Index created on the primary key path, if one had to be.
    pub index_created: Option<String>,
}

impl AddReport {
    /// Records processed.
    pub fn total(&self) -> usize {
        self.inserted + self.duplicates
    }
}

impl fmt::Display for AddReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.index_created {
            write!(f, "Index created on field {field:?}. ")?;
        }
        write!(f, "{} documents inserted.", self.inserted)?;
        if self.unkeyed > 0 {
            write!(f, " {} of them without a primary key.", self.unkeyed)?;
        }
        if self.duplicates > 0 {
            write!(f, " {} duplicates skipped.", self.duplicates)?;
        }
        Ok(())
    }
}

/// Result of `commit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Records written to the snapshot.
    pub committed: usize,
    /// Sequences folded into the signatures.
    pub sequences: usize,
}

impl CommitReport {
    /// Records processed.
    pub fn total(&self) -> usize {
        self.committed
    }
}

impl fmt::Display for CommitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries committed, {} sequences sketched.",
            self.committed, self.sequences
        )
    }
}

/// Result of `pull`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Records new to the cell.
    pub inserted: usize,
    /// Records whose content changed.
    pub replaced: usize,
    /// Records already up to date.
    pub unchanged: usize,
}

impl PullReport {
    /// Records processed.
    pub fn total(&self) -> usize {
        self.inserted + self.replaced + self.unchanged
    }
}

impl fmt::Display for PullReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            ("unchanged", self.unchanged),
            ("replaced", self.replaced),
            ("inserted", self.inserted),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(label, n)| format!("{n} entries {label}."))
        .collect();

        if parts.is_empty() {
            f.write_str("No entries pulled.")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

/// Result of `diff`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffReport {
    /// Snapshot records equal to their live counterpart.
    pub identical: usize,
    /// Snapshot records that differ from their live counterpart.
    pub different: usize,
    /// Snapshot records absent from the store.
    pub missing: usize,
}

impl DiffReport {
    /// Records processed.
    pub fn total(&self) -> usize {
        self.identical + self.different + self.missing
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} identical, {} different, {} missing from the cell.",
            self.identical, self.different, self.missing
        )
    }
}

/// Result of `status` for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    /// Cell name.
    pub cell: String,
    /// Records in the cell.
    pub count: usize,
    /// One record, when asked for and the cell is not empty.
    pub example: Option<Value>,
}

impl StatusReport {
    /// Records counted.
    pub fn total(&self) -> usize {
        self.count
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} documents.", self.cell, self.count)
    }
}
